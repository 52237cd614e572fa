//! A small scripted page: a trigger toggles a drawer over a shared channel.

use live_widgets::{PointerEvent, Runtime, dom::WIDGET_ATTR};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut rt = Runtime::new();
    live_widgets_kit::load(&mut rt).expect("kit widgets register cleanly");

    // Markup: a drawer and a trigger joined only by the "menu" channel.
    let root = rt.document().root();
    let drawer = rt.document_mut().create_element("div");
    rt.document_mut().append_child(root, drawer).unwrap();
    rt.document_mut().set_attr(drawer, WIDGET_ATTR, "drawer").unwrap();
    rt.document_mut().set_attr(drawer, "data-link", "menu").unwrap();
    rt.document_mut().set_attr(drawer, "data-channel", "nav").unwrap();
    rt.document_mut()
        .element_mut(drawer)
        .unwrap()
        .set_client_height(150.0);

    let trigger = rt.document_mut().create_element("a");
    rt.document_mut().append_child(root, trigger).unwrap();
    rt.document_mut()
        .set_attr(trigger, WIDGET_ATTR, "event-trigger")
        .unwrap();
    rt.document_mut().set_attr(trigger, "data-link", "menu").unwrap();
    rt.document_mut()
        .set_attr(trigger, "data-message", "toggle-drawer")
        .unwrap();
    rt.document_mut().set_attr(trigger, "data-channel", "nav").unwrap();

    // Let the monitor pick both elements up, then click the trigger and run
    // the drawer animation to completion.
    rt.advance(33);
    rt.dispatch(&PointerEvent::click(trigger));
    rt.advance(33 * 20);

    println!("{}", serde_json::to_string_pretty(&rt.dump()).unwrap());
}
