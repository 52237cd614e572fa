//! Event-trigger widget: broadcast a configured message on click.
//!
//! The trigger is the smallest possible framework client: markup supplies a
//! `data-message` and optional `data-channel`, and every click on the element
//! broadcasts that message on the trigger's link channel. Useful for wiring
//! buttons to drawers without any direct references between them.

use live_widgets::{EventKind, ListenerScope, Result, Runtime, Value, WidgetDescriptor};

/// The event-trigger descriptor.
pub fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("event-trigger")
        .on_reinit(|ctx| {
            let el = ctx.element();
            ctx.listen(ListenerScope::Element(el), EventKind::Click, "fire");
            Ok(())
        })
        .action("fire", |ctx, _args| {
            let message = ctx.model().get("message").cloned().unwrap_or(Value::Null);
            let channel = ctx.model().get_str("channel").map(str::to_string);
            let delivered = ctx.send_message(message, channel.as_deref());
            Ok(Value::Int(delivered as i64))
        })
}

/// Register the event-trigger with a runtime.
pub fn register(rt: &mut Runtime) -> Result<()> {
    rt.add_widget(descriptor())
}
