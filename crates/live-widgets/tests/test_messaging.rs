use std::rc::Rc;

use live_widgets::{
    Envelope, Error, MAX_DELIVERY_DEPTH, Model, Runtime, SubscriberId, Value, WidgetDescriptor,
    dom::{ElementId, WIDGET_ATTR},
};

/// A widget that counts the envelopes it receives and records the last
/// channel discriminator in its model.
fn probe(name: &str) -> WidgetDescriptor {
    WidgetDescriptor::new(name).on_message(|ctx, message, channel| {
        let seen = ctx.model().get_i64("seen").unwrap_or(0) + 1;
        ctx.model_mut().set("seen", seen);
        ctx.model_mut().set("last_message", message.clone());
        if let Some(ch) = channel {
            ctx.model_mut().set("last_channel", ch);
        }
        Ok(())
    })
}

/// Append a linked element for the named widget.
fn add_linked(rt: &mut Runtime, name: &str, link: &str) -> ElementId {
    let root = rt.document().root();
    let el = rt.document_mut().create_element("div");
    rt.document_mut().set_attr(el, WIDGET_ATTR, name).unwrap();
    rt.document_mut().set_attr(el, "data-link", link).unwrap();
    rt.document_mut().append_child(root, el).unwrap();
    el
}

#[test]
fn broadcast_reaches_every_subscriber() {
    let mut rt = Runtime::new();
    rt.add_widget(probe("probe")).unwrap();
    rt.add_widget(
        WidgetDescriptor::new("sender")
            .model(Model::new().with("link", "c"))
            .action("announce", |ctx, _| {
                let n = ctx.send_message("hello", Some("greetings"));
                Ok(Value::Int(n as i64))
            }),
    )
    .unwrap();

    let a = add_linked(&mut rt, "probe", "c");
    let b = add_linked(&mut rt, "probe", "c");
    let sender = {
        let root = rt.document().root();
        let el = rt.document_mut().create_element("div");
        rt.document_mut().set_attr(el, WIDGET_ATTR, "sender").unwrap();
        rt.document_mut().append_child(root, el).unwrap();
        el
    };
    rt.search_for_elements();

    let sender_id = rt.instance_for_element(sender).unwrap();
    // Three subscribers: both probes plus the sender itself (self-broadcast
    // is not filtered).
    assert_eq!(rt.invoke(sender_id, "announce", &[]), Ok(Value::Int(3)));

    for el in [a, b] {
        let id = rt.instance_for_element(el).unwrap();
        let model = rt.instance(id).unwrap().model();
        assert_eq!(model.get_i64("seen"), Some(1));
        assert_eq!(model.get_str("last_message"), Some("hello"));
        assert_eq!(model.get_str("last_channel"), Some("greetings"));
    }
}

#[test]
fn failing_subscriber_does_not_block_the_rest() {
    let mut rt = Runtime::new();
    rt.add_widget(probe("probe")).unwrap();
    rt.add_widget(
        WidgetDescriptor::new("faulty")
            .on_message(|_, _, _| Err(Error::Widget("handler exploded".into()))),
    )
    .unwrap();

    // Subscriber-id order puts the faulty instance first.
    let faulty = add_linked(&mut rt, "faulty", "c");
    let healthy = add_linked(&mut rt, "probe", "c");
    rt.search_for_elements();

    let delivered = rt.send_message("c", &Envelope::new("ping", None));
    assert_eq!(delivered, 1);

    let id = rt.instance_for_element(healthy).unwrap();
    assert_eq!(rt.instance(id).unwrap().model().get_i64("seen"), Some(1));
    // The faulty instance is still live; failure was isolated, not fatal.
    assert!(rt.instance_for_element(faulty).is_some());
}

#[test]
fn unknown_channel_is_a_silent_noop() {
    let mut rt = Runtime::new();
    assert_eq!(rt.send_message("nobody", &Envelope::new("ping", None)), 0);
}

#[test]
fn reentrant_echo_is_bounded() {
    let mut rt = Runtime::new();
    // An echo widget that broadcasts everything it hears back onto its own
    // channel. Without the depth guard this would recurse forever.
    rt.add_widget(WidgetDescriptor::new("echo").on_message(|ctx, _message, _channel| {
        let seen = ctx.model().get_i64("seen").unwrap_or(0) + 1;
        ctx.model_mut().set("seen", seen);
        ctx.send_message("echo", None);
        Ok(())
    }))
    .unwrap();

    let el = add_linked(&mut rt, "echo", "loop");
    rt.search_for_elements();

    rt.send_message("loop", &Envelope::new("start", None));

    let id = rt.instance_for_element(el).unwrap();
    assert_eq!(
        rt.instance(id).unwrap().model().get_i64("seen"),
        Some(MAX_DELIVERY_DEPTH as i64)
    );
}

#[test]
fn explicit_subscriber_ids_upsert() {
    let mut rt = Runtime::new();
    let sid = SubscriberId::from_raw(7);
    rt.register_listener("c", sid, Rc::new(|_, _| Err(Error::Widget("stale".into()))));
    // Re-registering the same id replaces the callback outright.
    rt.register_listener("c", sid, Rc::new(|_, _| Ok(())));
    assert_eq!(rt.send_message("c", &Envelope::new("ping", None)), 1);
}
