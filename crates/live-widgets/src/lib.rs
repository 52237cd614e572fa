//! live-widgets: a declarative widget runtime.
//!
//! The runtime discovers elements in a document tree, instantiates stateful
//! widget instances bound to them, and lets instances exchange messages
//! through named channels instead of direct references.
//!
//! # Quick start
//!
//! The main entry points are:
//! - [`Runtime`] - the explicitly constructed context object owning the
//!   document, catalog, instances, bus and clock
//! - [`WidgetDescriptor`] - the declarative registration input
//! - [`WidgetCtx`] - the execution context handed to widget behavior
//!
//! ```
//! use live_widgets::{Model, Runtime, Value, WidgetDescriptor, dom::WIDGET_ATTR};
//!
//! let mut rt = Runtime::new();
//! rt.add_widget(
//!     WidgetDescriptor::new("counter")
//!         .model(Model::new().with("count", 0))
//!         .action("bump", |ctx, _args| {
//!             let n = ctx.model().get_i64("count").unwrap_or(0) + 1;
//!             ctx.model_mut().set("count", n);
//!             Ok(Value::Int(n))
//!         }),
//! )
//! .unwrap();
//!
//! let root = rt.document().root();
//! let el = rt.document_mut().create_element("div");
//! rt.document_mut().append_child(root, el).unwrap();
//! rt.document_mut().set_attr(el, WIDGET_ATTR, "counter").unwrap();
//!
//! // The scan timer fires every 33 ticks.
//! rt.advance(33);
//! let id = rt.instance_for_element(el).unwrap();
//! assert_eq!(rt.invoke(id, "bump", &[]).unwrap(), Value::Int(1));
//! ```

#![warn(missing_docs)]

/// Widget descriptors and their compiled form.
pub mod descriptor;
/// The arena-backed document tree.
pub mod dom;
/// Core error types.
pub mod error;
/// Publish/subscribe messaging.
pub mod message;
/// Per-instance state bags.
pub mod model;
/// The document monitor.
pub mod monitor;
/// Validated widget names.
pub mod name;
/// The widget catalog.
pub mod registry;
/// The widget runtime and execution context.
pub mod runtime;
/// Virtual-clock timers.
pub mod timer;
/// Dynamic model values.
pub mod value;

/// Test utilities.
#[cfg(any(test, feature = "testing"))]
pub mod tutils;

pub use descriptor::{
    Action, Controller, Hook, MessageHook, RESERVED_ACTIONS, WidgetDescriptor, WidgetSpec,
};
pub use dom::{Document, Element, ElementId, EventKind, PointerEvent, Style};
pub use error::{Error, Result};
pub use message::{Envelope, MAX_DELIVERY_DEPTH, MessageBus, SubscriberId};
pub use model::Model;
pub use monitor::{DEFAULT_SCAN_INTERVAL, MonitorConfig};
pub use name::WidgetName;
pub use registry::Registry;
pub use runtime::{InstanceId, ListenerScope, Runtime, WidgetCtx, WidgetInstance};
pub use timer::TimerId;
pub use value::Value;
