//! Node structures for the element tree.
//!
//! Every element is held as an `Rc<RefCell<ElementInner>>`. A parent owns its
//! children; the link back to the parent is weak, so a tree never forms a
//! reference cycle and is dropped as a whole when the root goes away.
//!
//! Children are reachable two ways: in document order through
//! [`ElementInner::children`], and grouped by tag through
//! [`ElementInner::children_by_tag`]. Both are updated together by
//! [`ElementInner::add_child_to_ref`], the only way a child enters a tree.

mod lookup;

pub use lookup::Parts;

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// A reference-counted pointer to an element.
pub type ElementRef = Rc<RefCell<ElementInner>>;

/// A non-owning pointer to an element.
pub type WeakElementRef = Weak<RefCell<ElementInner>>;

/// Attribute name to value mapping.
pub type Attributes = HashMap<String, String>;

/// The data of one element in the tree.
pub struct ElementInner {
    /// Element name.
    tag: String,
    /// Attributes from the open event.
    attributes: Attributes,
    /// Character data of this element and all its descendants.
    text: Option<String>,
    /// Child elements in document order.
    children: Vec<ElementRef>,
    /// Child elements grouped by tag, each group in document order.
    children_by_tag: FxHashMap<String, Vec<ElementRef>>,
    /// Weak reference to parent element.
    parent: WeakElementRef,
    /// Zero-based position among siblings (None for root).
    child_pos: Option<usize>,
}

impl ElementInner {
    /// Creates a detached element with the given tag and attributes.
    pub(crate) fn new(tag: impl Into<String>, attributes: Attributes) -> Self {
        ElementInner {
            tag: tag.into(),
            attributes,
            text: None,
            children: Vec::new(),
            children_by_tag: FxHashMap::default(),
            parent: Weak::new(),
            child_pos: None,
        }
    }

    /// Returns the element name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns the value of one attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the accumulated character data.
    ///
    /// This includes the text of every descendant, concatenated in document
    /// order. `None` means no character data ever reached this element.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Alias for [`text`](Self::text).
    pub fn contents(&self) -> Option<&str> {
        self.text()
    }

    /// Returns the number of child elements.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[ElementRef] {
        &self.children
    }

    /// Returns the tag of each child, parallel to [`children`](Self::children).
    pub fn child_tags(&self) -> Vec<String> {
        self.children
            .iter()
            .map(|child| child.borrow().tag.clone())
            .collect()
    }

    /// Returns the tag-keyed grouping of the children.
    pub fn children_by_tag(&self) -> &FxHashMap<String, Vec<ElementRef>> {
        &self.children_by_tag
    }

    /// Returns the parent element, if this is not the root and the parent is
    /// still alive.
    pub fn parent(&self) -> Option<ElementRef> {
        self.parent.upgrade()
    }

    /// Returns the position among siblings (None for root).
    pub fn index_in_parent(&self) -> Option<usize> {
        self.child_pos
    }

    /// Returns true if this element has no parent.
    pub fn is_root(&self) -> bool {
        self.child_pos.is_none()
    }

    /// Appends a fragment to this element's text.
    pub(crate) fn append_text(&mut self, fragment: &str) {
        self.text.get_or_insert_with(String::new).push_str(fragment);
    }
}

/// Helper functions that work with ElementRef.
impl ElementInner {
    /// Appends a child element. Must be called on the ElementRef wrapper.
    ///
    /// Links the child to its parent, records its sibling position, and adds
    /// it to both the ordered child list and its tag group.
    pub fn add_child_to_ref(parent_ref: &ElementRef, child_ref: ElementRef) {
        let tag = {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = Some(parent_ref.borrow().children.len());
            child.tag.clone()
        };
        let mut parent = parent_ref.borrow_mut();
        parent
            .children_by_tag
            .entry(tag)
            .or_default()
            .push(Rc::clone(&child_ref));
        parent.children.push(child_ref);
    }

    /// Returns the chain of ancestors of a node, nearest first.
    pub fn ancestors_of_ref(node_ref: &ElementRef) -> Vec<ElementRef> {
        let mut ancestors = Vec::new();
        let mut next = node_ref.borrow().parent();
        while let Some(node) = next {
            next = node.borrow().parent();
            ancestors.push(node);
        }
        ancestors
    }

    /// Returns the number of ancestors of a node (0 for root).
    pub fn depth_of_ref(node_ref: &ElementRef) -> usize {
        Self::ancestors_of_ref(node_ref).len()
    }
}

impl fmt::Debug for ElementInner {
    // Children are summarized; a full dump would recurse through the subtree.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementInner")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("children", &self.children.len())
            .field("child_pos", &self.child_pos)
            .finish()
    }
}

impl Drop for ElementInner {
    /// Tears the subtree down with a work list, so dropping a deeply nested
    /// tree does not recurse once per level.
    fn drop(&mut self) {
        self.children_by_tag.clear();
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            // Nodes still referenced elsewhere stay alive with their subtree
            if let Ok(cell) = Rc::try_unwrap(child) {
                let mut inner = cell.into_inner();
                inner.children_by_tag.clear();
                pending.append(&mut inner.children);
            }
        }
    }
}

/// Creates a new detached element wrapped in ElementRef.
pub fn new_element(tag: impl Into<String>, attributes: Attributes) -> ElementRef {
    Rc::new(RefCell::new(ElementInner::new(tag, attributes)))
}
