//! The widget catalog.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    descriptor::{WidgetDescriptor, WidgetSpec},
    error::{Error, Result},
    name::WidgetName,
};

/// The catalog of registered widget types, keyed by validated name.
#[derive(Default)]
pub struct Registry {
    /// Compiled specs by name.
    widgets: HashMap<WidgetName, WidgetSpec>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, compile and store a descriptor. Re-adding a name silently
    /// overwrites the prior registration; live instances of the old version
    /// are unaffected.
    pub fn add_widget(&mut self, descriptor: WidgetDescriptor) -> Result<()> {
        let spec = WidgetSpec::compile(descriptor)?;
        self.insert(spec);
        Ok(())
    }

    /// Register an extension of `base` under the extension descriptor's own
    /// name. The new spec owns merged copies of the base's behavior tables;
    /// there is no aliasing between the two types.
    pub fn extend_widget(&mut self, base: &str, descriptor: WidgetDescriptor) -> Result<()> {
        let base_spec = self
            .lookup(base)
            .ok_or_else(|| Error::UnknownWidget(base.to_string()))?;
        let spec = WidgetSpec::extend(base_spec, descriptor)?;
        self.insert(spec);
        Ok(())
    }

    /// Store a compiled spec, logging when it displaces a prior registration.
    fn insert(&mut self, spec: WidgetSpec) {
        let name = spec.name.clone();
        if self.widgets.insert(name.clone(), spec).is_some() {
            debug!(widget = %name, "widget registration overwritten");
        }
    }

    /// Look up a spec by raw name.
    pub fn lookup(&self, name: &str) -> Option<&WidgetSpec> {
        let name = WidgetName::try_from(name).ok()?;
        self.widgets.get(&name)
    }

    /// Is the name registered?
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &WidgetName> {
        self.widgets.keys()
    }

    /// Number of registered widget types.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}
