//! Widget descriptors and their compiled form.
//!
//! A [`WidgetDescriptor`] is the declarative registration input: model
//! defaults, a controller of named actions, and lifecycle hooks. Registration
//! validates it and compiles it into a [`WidgetSpec`], the fully-populated
//! template the runtime builds instances from.

use std::{collections::BTreeMap, fmt, rc::Rc};

use crate::{
    error::{Error, Result},
    model::Model,
    name::WidgetName,
    runtime::WidgetCtx,
    value::Value,
};

/// Action names that would shadow the instance's own surface. A controller
/// declaring any of these is rejected at registration.
pub const RESERVED_ACTIONS: &[&str] = &["reinit", "send_message", "model", "controller", "element"];

/// A lifecycle hook (construct or reinit), run with the instance's context.
pub type Hook = Rc<dyn Fn(&mut WidgetCtx<'_>) -> Result<()>>;

/// A message handler: `(message, channel)` as unwrapped from the envelope.
pub type MessageHook = Rc<dyn Fn(&mut WidgetCtx<'_>, &Value, Option<&str>) -> Result<()>>;

/// A controller action.
pub type Action = Rc<dyn Fn(&mut WidgetCtx<'_>, &[Value]) -> Result<Value>>;

/// A widget's behavior set: a table of named actions. Actions are shared by
/// `Rc`, so cloning a controller clones the table, not the closures.
#[derive(Clone, Default)]
pub struct Controller {
    /// Action table in name order.
    actions: BTreeMap<String, Action>,
}

impl Controller {
    /// Create an empty controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style action declaration.
    pub fn action(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut WidgetCtx<'_>, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.actions.insert(name.into(), Rc::new(f));
        self
    }

    /// Insert an already-boxed action.
    pub fn set(&mut self, name: impl Into<String>, action: Action) {
        self.actions.insert(name.into(), action);
    }

    /// Look up an action, cloning the shared handle.
    pub fn get(&self, name: &str) -> Option<Action> {
        self.actions.get(name).cloned()
    }

    /// Does the controller declare the action?
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Action names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Is the controller empty?
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Overlay every action from `other` onto this controller.
    pub fn merge(&mut self, other: &Self) {
        for (name, action) in &other.actions {
            self.actions.insert(name.clone(), Rc::clone(action));
        }
    }

    /// Schema check: reject controllers that declare a reserved action name.
    pub fn validate(&self) -> Result<()> {
        for reserved in RESERVED_ACTIONS {
            if self.actions.contains_key(*reserved) {
                return Err(Error::ReservedAction((*reserved).to_string()));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

/// Declarative registration input for a widget type.
///
/// A fresh descriptor is already fully populated: empty model and controller,
/// no-op construct and reinit hooks, no message handler. Builder methods fill
/// in the parts a widget needs.
#[derive(Clone)]
pub struct WidgetDescriptor {
    /// Name the widget registers under; matched against `data-widget`.
    name: String,
    /// Model defaults.
    model: Model,
    /// Behavior set.
    controller: Controller,
    /// Construct hook, if supplied.
    construct: Option<Hook>,
    /// Reinit hook, if supplied.
    reinit: Option<Hook>,
    /// Message handler, if supplied.
    handle_message: Option<MessageHook>,
}

impl WidgetDescriptor {
    /// Start a descriptor for the named widget.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: Model::new(),
            controller: Controller::new(),
            construct: None,
            reinit: None,
            handle_message: None,
        }
    }

    /// Declare model defaults.
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Declare the full controller.
    pub fn controller(mut self, controller: Controller) -> Self {
        self.controller = controller;
        self
    }

    /// Declare a single controller action.
    pub fn action(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut WidgetCtx<'_>, &[Value]) -> Result<Value> + 'static,
    ) -> Self {
        self.controller = self.controller.action(name, f);
        self
    }

    /// Declare the construct hook, run once per instance after attribute
    /// projection.
    pub fn on_construct(mut self, f: impl Fn(&mut WidgetCtx<'_>) -> Result<()> + 'static) -> Self {
        self.construct = Some(Rc::new(f));
        self
    }

    /// Declare the reinit hook, run after construction and whenever the
    /// widget re-initializes itself.
    pub fn on_reinit(mut self, f: impl Fn(&mut WidgetCtx<'_>) -> Result<()> + 'static) -> Self {
        self.reinit = Some(Rc::new(f));
        self
    }

    /// Declare the message handler invoked for envelopes on the instance's
    /// link channel.
    pub fn on_message(
        mut self,
        f: impl Fn(&mut WidgetCtx<'_>, &Value, Option<&str>) -> Result<()> + 'static,
    ) -> Self {
        self.handle_message = Some(Rc::new(f));
        self
    }

    /// The declared name, unvalidated.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A no-op lifecycle hook.
fn noop_hook() -> Hook {
    Rc::new(|_| Ok(()))
}

/// A no-op message handler.
fn noop_message_hook() -> MessageHook {
    Rc::new(|_, _, _| Ok(()))
}

/// The compiled, fully-populated template the runtime instantiates widgets
/// from. Extension produces a new spec that owns merged copies of the base's
/// tables; the two specs never alias, so later mutation of one cannot leak
/// into the other.
#[derive(Clone)]
pub struct WidgetSpec {
    /// Validated widget name.
    pub(crate) name: WidgetName,
    /// Model defaults.
    pub(crate) model: Model,
    /// Behavior set.
    pub(crate) controller: Controller,
    /// Construct chain, base-first. Extensions append their own hook.
    pub(crate) constructs: Vec<Hook>,
    /// Reinit hook.
    pub(crate) reinit: Hook,
    /// Message handler.
    pub(crate) handle_message: MessageHook,
}

impl WidgetSpec {
    /// Validate and compile a descriptor. Missing hooks become no-ops.
    pub fn compile(descriptor: WidgetDescriptor) -> Result<Self> {
        let name = WidgetName::try_from(descriptor.name.as_str())?;
        descriptor.controller.validate()?;
        Ok(Self {
            name,
            model: descriptor.model,
            controller: descriptor.controller,
            constructs: vec![descriptor.construct.unwrap_or_else(noop_hook)],
            reinit: descriptor.reinit.unwrap_or_else(noop_hook),
            handle_message: descriptor.handle_message.unwrap_or_else(noop_message_hook),
        })
    }

    /// Compile an extension of `base`. The base's construct chain runs first,
    /// then the extension's construct; model defaults and actions are merged
    /// with the extension's layered on top; reinit and the message handler
    /// fall back to the base's when the extension does not supply its own.
    pub fn extend(base: &Self, descriptor: WidgetDescriptor) -> Result<Self> {
        let name = WidgetName::try_from(descriptor.name.as_str())?;
        descriptor.controller.validate()?;

        let mut model = base.model.clone();
        model.merge(&descriptor.model);

        let mut controller = base.controller.clone();
        controller.merge(&descriptor.controller);

        let mut constructs = base.constructs.clone();
        constructs.push(descriptor.construct.unwrap_or_else(noop_hook));

        Ok(Self {
            name,
            model,
            controller,
            constructs,
            reinit: descriptor.reinit.unwrap_or_else(|| Rc::clone(&base.reinit)),
            handle_message: descriptor
                .handle_message
                .unwrap_or_else(|| Rc::clone(&base.handle_message)),
        })
    }

    /// The widget's validated name.
    pub fn name(&self) -> &WidgetName {
        &self.name
    }

    /// The widget's model defaults.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The widget's behavior set.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl fmt::Debug for WidgetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetSpec")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("controller", &self.controller)
            .field("constructs", &self.constructs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_actions_rejected() {
        let c = Controller::new().action("model", |_, _| Ok(Value::Null));
        assert_eq!(c.validate(), Err(Error::ReservedAction("model".into())));

        let ok = Controller::new().action("show", |_, _| Ok(Value::Null));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn compile_fills_defaults() {
        let spec = WidgetSpec::compile(WidgetDescriptor::new("drawer")).unwrap();
        assert_eq!(*spec.name(), "drawer");
        assert!(spec.model().is_empty());
        assert!(spec.controller().is_empty());
        assert_eq!(spec.constructs.len(), 1);
    }

    #[test]
    fn compile_validates() {
        assert_eq!(
            WidgetSpec::compile(WidgetDescriptor::new("")).unwrap_err(),
            Error::MissingName
        );
        assert!(matches!(
            WidgetSpec::compile(WidgetDescriptor::new("Bad Name")).unwrap_err(),
            Error::InvalidName(_)
        ));
        let d = WidgetDescriptor::new("x").action("element", |_, _| Ok(Value::Null));
        assert_eq!(
            WidgetSpec::compile(d).unwrap_err(),
            Error::ReservedAction("element".into())
        );
    }

    #[test]
    fn extend_layers_tables() {
        let base = WidgetSpec::compile(
            WidgetDescriptor::new("base")
                .model(Model::new().with("a", 1).with("b", 1))
                .action("go", |_, _| Ok(Value::Int(1))),
        )
        .unwrap();

        let ext = WidgetSpec::extend(
            &base,
            WidgetDescriptor::new("ext")
                .model(Model::new().with("b", 2))
                .action("stop", |_, _| Ok(Value::Int(2))),
        )
        .unwrap();

        assert_eq!(ext.model().get_i64("a"), Some(1));
        assert_eq!(ext.model().get_i64("b"), Some(2));
        assert!(ext.controller().contains("go"));
        assert!(ext.controller().contains("stop"));
        assert_eq!(ext.constructs.len(), 2);
        // The base is untouched.
        assert!(!base.controller().contains("stop"));
        assert_eq!(base.model().get_i64("b"), Some(1));
    }
}
