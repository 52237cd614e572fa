//! Drawer widget: a container that slides open and shut.
//!
//! On construction the drawer captures its element's natural height, then
//! collapses it. `show`/`hide` animate the height in fifteen steps on a
//! repeating timer; `toggle` picks whichever applies. A drawer with a `link`
//! channel also responds to `show-drawer`/`hide-drawer`/`toggle-drawer`
//! messages tagged with its configured `channel`.

use live_widgets::{Result, Runtime, TimerId, Value, WidgetCtx, WidgetDescriptor};

/// Ticks between animation steps.
const ANIMATION_INTERVAL: u64 = 33;
/// Number of animation steps from closed to fully open.
const STEPS: f64 = 15.0;

/// Render a pixel length, dropping the fraction when it is whole.
fn px(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}px", v.round() as i64)
    } else {
        format!("{v}px")
    }
}

/// Parse a pixel length back out of an inline style value.
fn parse_px(v: Option<String>) -> f64 {
    v.as_deref()
        .and_then(|s| s.strip_suffix("px"))
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Cancel the running animation timer, if any. The handle lives in the
/// model so show/hide can displace each other mid-animation.
fn clear_animation(ctx: &mut WidgetCtx<'_>) {
    if let Some(raw) = ctx.model().get_i64("interval") {
        ctx.clear_timer(TimerId::from_raw(raw as u64));
        ctx.model_mut().remove("interval");
    }
}

/// Arm the animation timer for a step action, recording the handle.
fn start_animation(ctx: &mut WidgetCtx<'_>, step_action: &str) {
    let t = ctx.set_interval(step_action, ANIMATION_INTERVAL);
    ctx.model_mut().set("interval", Value::Int(t.raw() as i64));
}

/// The drawer descriptor.
pub fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("drawer")
        .on_construct(|ctx| {
            let height = ctx.client_height();
            ctx.model_mut().set("height", Value::Float(height));
            ctx.set_style("height", "0px");
            ctx.set_style("display", "none");
            Ok(())
        })
        .action("show", |ctx, _args| {
            clear_animation(ctx);
            ctx.set_style("display", "");
            start_animation(ctx, "increase_height");
            Ok(Value::Null)
        })
        .action("hide", |ctx, _args| {
            clear_animation(ctx);
            start_animation(ctx, "decrease_height");
            Ok(Value::Null)
        })
        .action("toggle", |ctx, _args| {
            if ctx.style("display").as_deref() == Some("none") {
                ctx.invoke("show", &[])
            } else {
                ctx.invoke("hide", &[])
            }
        })
        .action("increase_height", |ctx, _args| {
            let height = ctx.model().get_f64("height").unwrap_or(0.0);
            let step = height / STEPS;
            let current = parse_px(ctx.style("height"));
            let next = current + step;
            if step <= 0.0 || next + step > height {
                ctx.set_style("height", &px(height.max(0.0)));
                ctx.set_style("display", "");
                clear_animation(ctx);
                Ok(Value::Bool(false))
            } else {
                ctx.set_style("height", &px(next));
                Ok(Value::Bool(true))
            }
        })
        .action("decrease_height", |ctx, _args| {
            let height = ctx.model().get_f64("height").unwrap_or(0.0);
            let step = height / STEPS;
            let current = parse_px(ctx.style("height"));
            let next = current - step;
            if step <= 0.0 || next - step < 0.0 {
                ctx.set_style("height", "0px");
                ctx.set_style("display", "none");
                clear_animation(ctx);
                Ok(Value::Bool(false))
            } else {
                ctx.set_style("height", &px(next));
                Ok(Value::Bool(true))
            }
        })
        .on_message(|ctx, message, channel| {
            if channel != ctx.model().get_str("channel") {
                return Ok(());
            }
            match message.as_str() {
                Some("show-drawer") => ctx.invoke("show", &[]).map(|_| ()),
                Some("hide-drawer") => ctx.invoke("hide", &[]).map(|_| ()),
                Some("toggle-drawer") => ctx.invoke("toggle", &[]).map(|_| ()),
                _ => Ok(()),
            }
        })
}

/// Register the drawer with a runtime.
pub fn register(rt: &mut Runtime) -> Result<()> {
    rt.add_widget(descriptor())
}
