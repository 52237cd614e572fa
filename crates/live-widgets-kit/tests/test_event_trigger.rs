use live_widgets::{PointerEvent, Value, WidgetDescriptor, tutils::Harness};
use live_widgets_kit::{drawer, event_trigger};

#[test]
fn click_broadcasts_the_configured_message() {
    let mut h = Harness::new();
    event_trigger::register(&mut h.runtime).unwrap();
    let el = h.add_element(
        "button",
        &[
            ("data-widget", "event-trigger"),
            ("data-link", "nav"),
            ("data-message", "toggle-drawer"),
            ("data-channel", "menu"),
        ],
    );
    h.scan();
    let log = h.record_channel("nav");

    assert_eq!(h.runtime.dispatch(&PointerEvent::click(el)), 1);

    let envelopes = log.borrow();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].message, Value::Str("toggle-drawer".into()));
    assert_eq!(envelopes[0].channel.as_deref(), Some("menu"));
}

#[test]
fn clicks_elsewhere_do_not_fire() {
    let mut h = Harness::new();
    event_trigger::register(&mut h.runtime).unwrap();
    h.add_element(
        "button",
        &[("data-widget", "event-trigger"), ("data-link", "nav")],
    );
    h.scan();
    let log = h.record_channel("nav");

    let other = h.add_element("div", &[]);
    assert_eq!(h.runtime.dispatch(&PointerEvent::click(other)), 0);
    assert!(log.borrow().is_empty());
}

#[test]
fn unlinked_trigger_delivers_nothing() {
    let mut h = Harness::new();
    event_trigger::register(&mut h.runtime).unwrap();
    let el = h.add_element("button", &[("data-widget", "event-trigger")]);
    let ids = h.scan();

    // The click handler still runs, but with no link channel the broadcast
    // reaches nobody.
    assert_eq!(h.runtime.dispatch(&PointerEvent::click(el)), 1);
    assert_eq!(
        h.runtime.invoke(ids[0], "fire", &[]),
        Ok(Value::Int(0))
    );
}

#[test]
fn extended_trigger_keeps_the_base_behavior() {
    let mut h = Harness::new();
    event_trigger::register(&mut h.runtime).unwrap();
    // A trigger variant that counts its own firings on top of the inherited
    // broadcast.
    h.runtime
        .extend_widget(
            "event-trigger",
            WidgetDescriptor::new("counting-trigger").action("bump", |ctx, _| {
                let n = ctx.model().get_i64("fired").unwrap_or(0) + 1;
                ctx.model_mut().set("fired", n);
                Ok(Value::Int(n))
            }),
        )
        .unwrap();

    let el = h.add_element(
        "button",
        &[
            ("data-widget", "counting-trigger"),
            ("data-link", "nav"),
            ("data-message", "go"),
        ],
    );
    let ids = h.scan();
    let log = h.record_channel("nav");

    // The inherited click listener and fire action still work.
    assert_eq!(h.runtime.dispatch(&PointerEvent::click(el)), 1);
    assert_eq!(log.borrow().len(), 1);
    assert_eq!(log.borrow()[0].message, Value::Str("go".into()));

    assert_eq!(h.runtime.invoke(ids[0], "bump", &[]), Ok(Value::Int(1)));
}

#[test]
fn trigger_drives_a_drawer() {
    let mut h = Harness::new();
    drawer::register(&mut h.runtime).unwrap();
    event_trigger::register(&mut h.runtime).unwrap();

    let drawer_el = h.add_element(
        "div",
        &[
            ("data-widget", "drawer"),
            ("data-link", "nav"),
            ("data-channel", "menu"),
        ],
    );
    h.set_geometry(drawer_el, 300.0, 150.0, 0.0);
    let trigger_el = h.add_element(
        "button",
        &[
            ("data-widget", "event-trigger"),
            ("data-link", "nav"),
            ("data-message", "toggle-drawer"),
            ("data-channel", "menu"),
        ],
    );
    h.scan();
    assert_eq!(h.style(drawer_el, "display").as_deref(), Some("none"));

    h.runtime.dispatch(&PointerEvent::click(trigger_el));
    assert_eq!(h.style(drawer_el, "display").as_deref(), Some(""));
    h.runtime.advance(33 * 20);
    assert_eq!(h.style(drawer_el, "height").as_deref(), Some("150px"));
}
