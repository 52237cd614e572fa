//! Test utilities.
//!
//! A small harness that wraps a [`Runtime`] and takes the boilerplate out of
//! building marked-up documents and driving the clock in tests. Available to
//! downstream crates behind the `testing` feature.

use std::{cell::RefCell, rc::Rc};

use crate::{
    dom::ElementId,
    message::Envelope,
    model::Model,
    runtime::{InstanceId, Runtime},
};

/// Test harness around a runtime.
pub struct Harness {
    /// The runtime under test.
    pub runtime: Runtime,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    /// A harness with default configuration (scanning armed).
    pub fn new() -> Self {
        Self {
            runtime: Runtime::new(),
        }
    }

    /// Append an element with the given tag and attributes under the root.
    pub fn add_element(&mut self, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let root = self.runtime.document().root();
        let el = self.runtime.document_mut().create_element(tag);
        for (name, value) in attrs {
            self.runtime
                .document_mut()
                .set_attr(el, *name, *value)
                .expect("element just created");
        }
        self.runtime
            .document_mut()
            .append_child(root, el)
            .expect("root always present");
        el
    }

    /// Set the laid-out geometry of an element.
    pub fn set_geometry(&mut self, el: ElementId, width: f64, height: f64, offset_left: f64) {
        let e = self
            .runtime
            .document_mut()
            .element_mut(el)
            .expect("element present");
        e.set_client_width(width);
        e.set_client_height(height);
        e.set_offset_left(offset_left);
    }

    /// Run a scan pass directly, without waiting for the scan timer.
    pub fn scan(&mut self) -> Vec<InstanceId> {
        self.runtime.search_for_elements()
    }

    /// The model of a live instance. Panics if the instance is gone.
    pub fn model(&self, id: InstanceId) -> &Model {
        self.runtime
            .instance(id)
            .expect("instance present")
            .model()
    }

    /// The inline style property of an element, if set.
    pub fn style(&self, el: ElementId, prop: &str) -> Option<String> {
        self.runtime
            .document()
            .element(el)
            .and_then(|e| e.style().get(prop))
            .map(str::to_string)
    }

    /// Subscribe a recording callback to a channel, returning the shared log
    /// of envelopes it receives.
    pub fn record_channel(&mut self, channel: &str) -> Rc<RefCell<Vec<Envelope>>> {
        let log: Rc<RefCell<Vec<Envelope>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        self.runtime.subscribe(
            channel,
            Rc::new(move |_, env: &Envelope| {
                sink.borrow_mut().push(env.clone());
                Ok(())
            }),
        );
        log
    }
}
