//! An arena-backed document tree.
//!
//! The runtime does not run inside a browser, so it owns a minimal document
//! model of its own: elements with attributes, a small inline-style bag, and
//! the client geometry the declarative markup contract needs. Rendering is
//! out of scope; the tree exists so widgets can be discovered, marked, and
//! bound to state.

use std::collections::BTreeMap;

use slotmap::{SlotMap, new_key_type};

use crate::error::{Error, Result};

/// Attribute that names the widget type an element should be bound to.
pub const WIDGET_ATTR: &str = "data-widget";
/// Marker attribute stamped onto an element once initialization begins.
pub const WIDGET_ID_ATTR: &str = "data-widget-id";
/// Grouping attribute reserved by the markup contract; never projected.
pub const GROUP_ATTR: &str = "data-group";
/// Prefix for attributes projected into a widget's model.
pub const DATA_PREFIX: &str = "data-";

new_key_type! {
    /// Opaque identifier for an element stored in the document arena.
    pub struct ElementId;
}

/// Inline style bag. Only the properties the widget contract touches are
/// meaningful; everything else is carried opaquely.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Style {
    /// Stored property table.
    props: BTreeMap<String, String>,
}

impl Style {
    /// Look up a property.
    pub fn get(&self, prop: &str) -> Option<&str> {
        self.props.get(prop).map(String::as_str)
    }

    /// Set a property, replacing any existing value.
    pub fn set(&mut self, prop: impl Into<String>, value: impl Into<String>) {
        self.props.insert(prop.into(), value.into());
    }

    /// Remove a property.
    pub fn remove(&mut self, prop: &str) -> Option<String> {
        self.props.remove(prop)
    }
}

/// A single element in the document tree.
#[derive(Clone, Debug)]
pub struct Element {
    /// Tag name.
    tag: String,
    /// Attribute table, in name order.
    attributes: BTreeMap<String, String>,
    /// Inline style bag.
    style: Style,
    /// Parent element, if attached.
    parent: Option<ElementId>,
    /// Child elements, in document order.
    children: Vec<ElementId>,
    /// Laid-out width, as reported by `client_width`.
    client_width: f64,
    /// Laid-out height, as reported by `client_height`.
    client_height: f64,
    /// Horizontal offset of the element's box.
    offset_left: f64,
}

impl Element {
    /// Construct a detached element with the given tag.
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            style: Style::default(),
            parent: None,
            children: Vec::new(),
            client_width: 0.0,
            client_height: 0.0,
            offset_left: 0.0,
        }
    }

    /// Tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Remove an attribute.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Iterate over attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &String)> {
        self.attributes.iter()
    }

    /// Inline style, read-only.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Inline style, mutable.
    pub fn style_mut(&mut self) -> &mut Style {
        &mut self.style
    }

    /// Parent element, if attached.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Laid-out width.
    pub fn client_width(&self) -> f64 {
        self.client_width
    }

    /// Laid-out height.
    pub fn client_height(&self) -> f64 {
        self.client_height
    }

    /// Horizontal offset of the element's box.
    pub fn offset_left(&self) -> f64 {
        self.offset_left
    }

    /// Set the laid-out width.
    pub fn set_client_width(&mut self, width: f64) {
        self.client_width = width;
    }

    /// Set the laid-out height.
    pub fn set_client_height(&mut self, height: f64) {
        self.client_height = height;
    }

    /// Set the horizontal offset.
    pub fn set_offset_left(&mut self, offset: f64) {
        self.offset_left = offset;
    }
}

/// The live document: an arena of elements rooted at a single container.
pub struct Document {
    /// Element storage arena.
    elements: SlotMap<ElementId, Element>,
    /// Root element ID.
    root: ElementId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only the root container element.
    pub fn new() -> Self {
        let mut elements = SlotMap::with_key();
        let root = elements.insert(Element::new("body"));
        Self { elements, root }
    }

    /// Root element ID.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        self.elements.insert(Element::new(tag))
    }

    /// Attach a detached element as the last child of `parent`.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if !self.elements.contains_key(child) {
            return Err(Error::ElementNotFound);
        }
        let p = self.elements.get_mut(parent).ok_or(Error::ElementNotFound)?;
        p.children.push(child);
        // Unwrap is safe, presence was checked above.
        self.elements.get_mut(child).unwrap().parent = Some(parent);
        Ok(())
    }

    /// Detach an element from its parent and remove it, along with its whole
    /// subtree, from the arena. Removing the root is not permitted.
    pub fn remove(&mut self, id: ElementId) -> Result<()> {
        if id == self.root {
            return Err(Error::ElementNotFound);
        }
        let parent = self
            .elements
            .get(id)
            .ok_or(Error::ElementNotFound)?
            .parent;
        if let Some(p) = parent
            && let Some(pe) = self.elements.get_mut(p)
        {
            pe.children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(e) = stack.pop() {
            if let Some(el) = self.elements.remove(e) {
                stack.extend(el.children);
            }
        }
        Ok(())
    }

    /// Look up an element.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Look up an element mutably.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id)
    }

    /// Does the element exist in the arena?
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Number of elements in the document, root included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Is the document empty apart from the root?
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1
    }

    /// Call a closure on `from` and every element below it, in preorder.
    pub fn visit_preorder(&self, from: ElementId, f: &mut dyn FnMut(ElementId, &Element)) {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if let Some(el) = self.elements.get(id) {
                f(id, el);
                // Reversed so children are visited in document order.
                stack.extend(el.children.iter().rev());
            }
        }
    }

    /// Collect the IDs of `from` and every element below it, in preorder.
    pub fn collect_preorder(&self, from: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        self.visit_preorder(from, &mut |id, _| out.push(id));
        out
    }

    /// Convenience attribute lookup.
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(id).and_then(|el| el.attr(name))
    }

    /// Convenience attribute set.
    pub fn set_attr(
        &mut self,
        id: ElementId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.elements
            .get_mut(id)
            .ok_or(Error::ElementNotFound)?
            .set_attr(name, value);
        Ok(())
    }
}

/// Kind of a dispatched pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Primary button press.
    MouseDown,
    /// Pointer movement.
    MouseMove,
    /// Primary button release.
    MouseUp,
    /// Click (press and release on the same element).
    Click,
}

/// A pointer event fed into the runtime by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Event kind.
    pub kind: EventKind,
    /// Element the event targets, if any. Document-scoped listeners fire
    /// regardless of target.
    pub target: Option<ElementId>,
    /// Absolute horizontal pointer position.
    pub page_x: f64,
}

impl PointerEvent {
    /// A mouse-down event on `target`.
    pub fn mouse_down(target: ElementId, page_x: f64) -> Self {
        Self {
            kind: EventKind::MouseDown,
            target: Some(target),
            page_x,
        }
    }

    /// A pointer move with no particular target.
    pub fn mouse_move(page_x: f64) -> Self {
        Self {
            kind: EventKind::MouseMove,
            target: None,
            page_x,
        }
    }

    /// A mouse-up with no particular target.
    pub fn mouse_up(page_x: f64) -> Self {
        Self {
            kind: EventKind::MouseUp,
            target: None,
            page_x,
        }
    }

    /// A click on `target`.
    pub fn click(target: ElementId) -> Self {
        Self {
            kind: EventKind::Click,
            target: Some(target),
            page_x: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small document: root -> (a -> (b, c), d).
    fn sample() -> (Document, Vec<ElementId>) {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let c = doc.create_element("span");
        let d = doc.create_element("div");
        doc.append_child(doc.root(), a).unwrap();
        doc.append_child(a, b).unwrap();
        doc.append_child(a, c).unwrap();
        doc.append_child(doc.root(), d).unwrap();
        (doc, vec![a, b, c, d])
    }

    #[test]
    fn preorder_is_document_order() {
        let (doc, ids) = sample();
        let mut expect = vec![doc.root()];
        expect.extend(&ids);
        assert_eq!(doc.collect_preorder(doc.root()), expect);
    }

    #[test]
    fn remove_drops_subtree() {
        let (mut doc, ids) = sample();
        assert_eq!(doc.len(), 5);
        doc.remove(ids[0]).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(!doc.contains(ids[1]));
        assert!(doc.contains(ids[3]));
        assert!(doc.remove(doc.root()).is_err());
    }

    #[test]
    fn attributes_and_style() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.set_attr(el, WIDGET_ATTR, "drawer").unwrap();
        assert_eq!(doc.attr(el, WIDGET_ATTR), Some("drawer"));
        let e = doc.element_mut(el).unwrap();
        e.style_mut().set("height", "0px");
        assert_eq!(e.style().get("height"), Some("0px"));
    }
}
