use live_widgets::{
    Error, Model, Runtime, Value, WidgetDescriptor,
    dom::{ElementId, WIDGET_ATTR, WIDGET_ID_ATTR},
};

/// Append an element with the given attributes under the document root.
fn add_element(rt: &mut Runtime, attrs: &[(&str, &str)]) -> ElementId {
    let root = rt.document().root();
    let el = rt.document_mut().create_element("div");
    for (name, value) in attrs {
        rt.document_mut().set_attr(el, *name, *value).unwrap();
    }
    rt.document_mut().append_child(root, el).unwrap();
    el
}

#[test]
fn attribute_projection_and_precedence() {
    let mut rt = Runtime::new();
    rt.add_widget(
        WidgetDescriptor::new("card")
            .model(Model::new().with("title", "untitled").with("channel", "none")),
    )
    .unwrap();

    let el = add_element(
        &mut rt,
        &[
            (WIDGET_ATTR, "card"),
            ("data-title", "hello"),
            ("data-badge", "7"),
            ("data-group", "g1"),
            ("class", "plain"),
        ],
    );
    let id = rt.initialize_widget(el).unwrap();

    let model = rt.instance(id).unwrap().model();
    // Markup wins over declared defaults.
    assert_eq!(model.get_str("title"), Some("hello"));
    // Defaults survive when markup is silent.
    assert_eq!(model.get_str("channel"), Some("none"));
    // Projected values arrive as strings but read leniently as numbers.
    assert_eq!(model.get_f64("badge"), Some(7.0));
    // Reserved and non-data attributes are never projected.
    assert!(!model.contains("group"));
    assert!(!model.contains("widget"));
    assert!(!model.contains("class"));

    // The element is stamped with the instance id.
    assert_eq!(
        rt.document().attr(el, WIDGET_ID_ATTR),
        Some(id.to_string().as_str())
    );
}

#[test]
fn initialize_requires_registered_widget() {
    let mut rt = Runtime::new();
    let unmarked = add_element(&mut rt, &[]);
    assert_eq!(rt.initialize_widget(unmarked), Err(Error::MissingWidgetAttr));

    let unknown = add_element(&mut rt, &[(WIDGET_ATTR, "ghost")]);
    assert_eq!(
        rt.initialize_widget(unknown),
        Err(Error::UnknownWidget("ghost".into()))
    );
    // A failed lookup leaves no marker, so a later registration can still
    // claim the element.
    assert_eq!(rt.document().attr(unknown, WIDGET_ID_ATTR), None);
}

#[test]
fn reserved_controller_key_rejected() {
    let mut rt = Runtime::new();
    let err = rt.add_widget(WidgetDescriptor::new("x").action("model", |_, _| Ok(Value::Null)));
    assert_eq!(err, Err(Error::ReservedAction("model".into())));

    // Nothing was registered.
    let el = add_element(&mut rt, &[(WIDGET_ATTR, "x")]);
    assert!(matches!(
        rt.initialize_widget(el),
        Err(Error::UnknownWidget(_))
    ));
}

#[test]
fn reregistration_leaves_live_instances_alone() {
    let mut rt = Runtime::new();
    rt.add_widget(WidgetDescriptor::new("v").action("version", |_, _| Ok(Value::Int(1))))
        .unwrap();
    let el = add_element(&mut rt, &[(WIDGET_ATTR, "v")]);
    let old = rt.initialize_widget(el).unwrap();

    rt.add_widget(WidgetDescriptor::new("v").action("version", |_, _| Ok(Value::Int(2))))
        .unwrap();

    // The live instance still runs the behavior it was built with.
    assert_eq!(rt.invoke(old, "version", &[]), Ok(Value::Int(1)));

    // New instances pick up the new registration.
    let el2 = add_element(&mut rt, &[(WIDGET_ATTR, "v")]);
    let new = rt.initialize_widget(el2).unwrap();
    assert_eq!(rt.invoke(new, "version", &[]), Ok(Value::Int(2)));
}

#[test]
fn construction_failure_drops_widget_without_retry() {
    let mut rt = Runtime::new();
    rt.add_widget(
        WidgetDescriptor::new("broken")
            .on_construct(|_| Err(Error::Widget("construct exploded".into()))),
    )
    .unwrap();

    let el = add_element(&mut rt, &[(WIDGET_ATTR, "broken")]);
    let err = rt.initialize_widget(el).unwrap_err();
    assert!(matches!(err, Error::Instantiation { .. }));

    // No instance was stored, but the marker stays: the monitor must not
    // retry the element.
    assert_eq!(rt.instances().count(), 0);
    assert!(rt.document().attr(el, WIDGET_ID_ATTR).is_some());
    assert!(rt.search_for_elements().is_empty());
}

#[test]
fn failing_reinit_also_drops_the_instance() {
    let mut rt = Runtime::new();
    rt.add_widget(
        WidgetDescriptor::new("fragile")
            .model(Model::new().with("link", "c"))
            .on_reinit(|_| Err(Error::Widget("reinit exploded".into()))),
    )
    .unwrap();

    let el = add_element(&mut rt, &[(WIDGET_ATTR, "fragile")]);
    assert!(rt.initialize_widget(el).is_err());
    assert_eq!(rt.instances().count(), 0);

    // The link subscription taken out before reinit was rolled back.
    let envelope = live_widgets::Envelope::new("ping", None);
    assert_eq!(rt.send_message("c", &envelope), 0);
}
