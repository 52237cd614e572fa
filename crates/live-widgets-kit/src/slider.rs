//! Slider widget: a horizontal drag control.
//!
//! Mouse-down on the slider element begins a drag: document-scoped move and
//! up listeners track the pointer until release. Every drag step recomputes
//! `position` (clamped to the track) and `percent`; on release the percent is
//! broadcast on the slider's channel so linked widgets can react.

use live_widgets::{
    EventKind, ListenerScope, Model, Result, Runtime, Value, WidgetCtx, WidgetDescriptor,
};

/// Width of the drag handle; position clamps short of the track end by this
/// much.
const HANDLE_WIDTH: f64 = 12.0;

/// Pointer x from an event argument list.
fn page_x(args: &[Value]) -> f64 {
    args.first().and_then(Value::as_f64).unwrap_or(0.0)
}

/// Unbind the document-scoped drag listeners.
fn unbind_drag(ctx: &mut WidgetCtx<'_>) {
    ctx.unlisten(
        ListenerScope::Document,
        EventKind::MouseMove,
        "handle_mouse_move",
    );
    ctx.unlisten(ListenerScope::Document, EventKind::MouseUp, "handle_mouse_up");
}

/// The slider descriptor.
pub fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("slider")
        .model(Model::new().with("width", 0).with("position", 0).with("percent", 0))
        .on_construct(|ctx| {
            let width = ctx.client_width();
            let offset = ctx.offset_left();
            ctx.model_mut().set("width", Value::Float(width));
            ctx.model_mut().set("slider_offset", Value::Float(offset));
            // A markup-supplied starting percent back-computes the handle
            // position.
            let percent = ctx.model().get_f64("percent").unwrap_or(0.0);
            if percent != 0.0 {
                let position = (percent / 100.0 * width).floor();
                ctx.model_mut().set("position", Value::Float(position));
            }
            Ok(())
        })
        .on_reinit(|ctx| {
            let el = ctx.element();
            ctx.listen(
                ListenerScope::Element(el),
                EventKind::MouseDown,
                "handle_mouse_down",
            );
            Ok(())
        })
        .action("handle_mouse_down", |ctx, args| {
            ctx.invoke("handle_drag", args)?;
            ctx.listen(
                ListenerScope::Document,
                EventKind::MouseMove,
                "handle_mouse_move",
            );
            ctx.listen(ListenerScope::Document, EventKind::MouseUp, "handle_mouse_up");
            Ok(Value::Null)
        })
        .action("handle_mouse_move", |ctx, args| ctx.invoke("handle_drag", args))
        .action("handle_drag", |ctx, args| {
            let width = ctx.model().get_f64("width").unwrap_or(0.0);
            let offset = ctx.model().get_f64("slider_offset").unwrap_or(0.0);
            let position = (page_x(args) - offset).clamp(0.0, (width - HANDLE_WIDTH).max(0.0));
            let percent = if width > 0.0 {
                position / width * 100.0
            } else {
                0.0
            };
            ctx.model_mut().set("position", Value::Float(position));
            ctx.model_mut().set("percent", Value::Float(percent));
            Ok(Value::Float(position))
        })
        .action("handle_mouse_up", |ctx, _args| {
            let percent = ctx.model().get_f64("percent").unwrap_or(0.0);
            let channel = ctx.model().get_str("channel").map(str::to_string);
            ctx.send_message(Value::Float(percent), channel.as_deref());
            unbind_drag(ctx);
            Ok(Value::Null)
        })
}

/// Register the slider with a runtime.
pub fn register(rt: &mut Runtime) -> Result<()> {
    rt.add_widget(descriptor())
}
