//! Tree builder that consumes open/characters/close events.
//!
//! The builder keeps the chain of currently open elements as a stack. The top
//! of the stack is the active receiver: character data is appended to it and
//! to each of its ancestors, and a new child opened while it is active is
//! attached under it. A matching close pops it, handing events back to its
//! parent. When the root closes the stack is empty and the session is over.
//!
//! The very first open event names the root. No child is created for it.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::event::EventSink;
use crate::node::{new_element, Attributes, ElementInner, ElementRef};
use crate::options::MismatchPolicy;

/// Where the builder is in its single parse session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    /// No event yet; the root has not been named.
    Unnamed,
    /// At least one element is open and receiving events.
    Open,
    /// The root element has closed.
    Closed,
}

/// Builds an element tree from a stream of events.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    /// Root element, set by the first open event.
    root: Option<ElementRef>,
    /// Open elements from the root down to the active receiver.
    stack: Vec<ElementRef>,
    /// Handling of mismatched close events.
    policy: MismatchPolicy,
}

impl TreeBuilder {
    /// Creates a builder with the strict mismatch policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the given mismatch policy.
    pub fn with_policy(policy: MismatchPolicy) -> Self {
        TreeBuilder {
            policy,
            ..Self::default()
        }
    }

    /// Returns the mismatch policy in use.
    pub fn policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Returns the current session state.
    pub fn state(&self) -> BuildState {
        match (&self.root, self.stack.is_empty()) {
            (None, _) => BuildState::Unnamed,
            (Some(_), false) => BuildState::Open,
            (Some(_), true) => BuildState::Closed,
        }
    }

    /// Returns true once the root element has closed.
    pub fn is_complete(&self) -> bool {
        self.state() == BuildState::Closed
    }

    /// Returns the number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the active receiver, if any.
    pub fn current(&self) -> Option<&ElementRef> {
        self.stack.last()
    }

    /// Returns the root element once it has been named.
    pub fn root(&self) -> Option<&ElementRef> {
        self.root.as_ref()
    }

    /// Handles an element start.
    pub fn on_open(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        let parent = match self.state() {
            BuildState::Unnamed => {
                self.name_root(name, attributes);
                return Ok(());
            }
            BuildState::Closed => {
                return Err(self.violation(&format!("open <{}>", name)));
            }
            BuildState::Open => self.active()?,
        };

        trace!(tag = name, depth = self.stack.len(), "open");
        let child = new_element(name, attributes);
        ElementInner::add_child_to_ref(&parent, Rc::clone(&child));
        self.stack.push(child);
        Ok(())
    }

    /// Handles character data.
    ///
    /// The fragment is appended to the active receiver and to every ancestor
    /// up to the root.
    pub fn on_characters(&mut self, text: &str) -> Result<()> {
        if self.state() != BuildState::Open {
            return Err(self.violation("character data"));
        }

        trace!(len = text.len(), depth = self.stack.len(), "characters");
        let mut next = Some(self.active()?);
        while let Some(node) = next {
            node.borrow_mut().append_text(text);
            next = node.borrow().parent();
        }
        Ok(())
    }

    /// Handles an element end.
    pub fn on_close(&mut self, name: &str) -> Result<()> {
        if self.state() != BuildState::Open {
            return Err(self.violation(&format!("close </{}>", name)));
        }

        let active = self.active()?;
        let expected = active.borrow().tag().to_string();
        if expected != name {
            return match self.policy {
                MismatchPolicy::Strict => Err(Error::StructuralMismatch {
                    expected,
                    found: name.to_string(),
                }),
                MismatchPolicy::Lenient => {
                    warn!(
                        expected = %expected,
                        found = name,
                        "ignoring close tag that does not match the open element"
                    );
                    Ok(())
                }
            };
        }

        trace!(tag = name, depth = self.stack.len(), "close");
        self.stack.pop();
        if self.stack.is_empty() {
            debug!(root = name, "root element closed");
        }
        Ok(())
    }

    /// Consumes the builder and returns the finished tree.
    ///
    /// Fails if no element was ever opened or if elements are still open.
    pub fn finish(self) -> Result<ElementRef> {
        match self.state() {
            BuildState::Unnamed => Err(Error::EmptyDocument),
            BuildState::Open => {
                let tag = self
                    .stack
                    .last()
                    .map(|node| node.borrow().tag().to_string())
                    .unwrap_or_default();
                Err(Error::Unclosed { tag })
            }
            BuildState::Closed => self.root.ok_or(Error::EmptyDocument),
        }
    }

    /// Consumes the builder and returns the root as built so far.
    ///
    /// The tree may be incomplete; use this to inspect what a failed parse
    /// managed to build.
    pub fn into_partial(self) -> Option<ElementRef> {
        self.root
    }

    /// Names the root from the first open event.
    fn name_root(&mut self, name: &str, attributes: Attributes) {
        debug!(root = name, "naming root element");
        let root = new_element(name, attributes);
        self.stack.push(Rc::clone(&root));
        self.root = Some(root);
    }

    fn active(&self) -> Result<ElementRef> {
        self.stack
            .last()
            .cloned()
            .ok_or_else(|| Error::ProtocolViolation("no element is receiving events".into()))
    }

    fn violation(&self, event: &str) -> Error {
        let when = match self.state() {
            BuildState::Unnamed => "before the root element was opened",
            BuildState::Open => "while elements are open",
            BuildState::Closed => "after the root element closed",
        };
        Error::ProtocolViolation(format!("{} {}", event, when))
    }
}

impl EventSink for TreeBuilder {
    fn open(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        self.on_open(name, attributes)
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.on_characters(text)
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.on_close(name)
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Parts;

    fn id(value: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("id".to_string(), value.to_string());
        attributes
    }

    fn tag_of(node: &ElementRef) -> String {
        node.borrow().tag().to_string()
    }

    #[test]
    fn test_two_children_scenario() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_open("b", id("1")).unwrap();
        builder.on_characters("hi").unwrap();
        builder.on_close("b").unwrap();
        builder.on_open("b", id("2")).unwrap();
        builder.on_close("b").unwrap();
        builder.on_close("a").unwrap();
        assert!(builder.is_complete());

        let root = builder.finish().unwrap();
        let a = root.borrow();
        assert_eq!(a.tag(), "a");
        assert_eq!(a.child_tags(), vec!["b", "b"]);
        assert_eq!(a.text(), Some("hi"));
        assert_eq!(a.select("b", Parts::All).unwrap().len(), 2);
        assert_eq!(a.get("b").unwrap().borrow().attribute("id"), Some("1"));

        let last = a.select("b", Parts::Last).unwrap();
        assert_eq!(last[0].borrow().attribute("id"), Some("2"));
        assert_eq!(last[0].borrow().text(), None);
    }

    #[test]
    fn test_first_open_names_root() {
        let mut builder = TreeBuilder::new();
        assert_eq!(builder.state(), BuildState::Unnamed);
        assert!(builder.root().is_none());

        builder.on_open("doc", id("r")).unwrap();
        assert_eq!(builder.state(), BuildState::Open);
        assert_eq!(builder.depth(), 1);

        let root = builder.root().unwrap();
        assert_eq!(tag_of(root), "doc");
        assert_eq!(root.borrow().attribute("id"), Some("r"));
        assert_eq!(root.borrow().child_count(), 0);
        assert!(root.borrow().is_root());
    }

    #[test]
    fn test_receiver_moves_with_open_and_close() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_open("b", Attributes::new()).unwrap();
        builder.on_open("c", Attributes::new()).unwrap();
        assert_eq!(tag_of(builder.current().unwrap()), "c");
        assert_eq!(builder.depth(), 3);

        builder.on_close("c").unwrap();
        assert_eq!(tag_of(builder.current().unwrap()), "b");
        builder.on_open("d", Attributes::new()).unwrap();
        builder.on_close("d").unwrap();
        builder.on_close("b").unwrap();
        assert_eq!(tag_of(builder.current().unwrap()), "a");
        builder.on_close("a").unwrap();
        assert!(builder.current().is_none());

        let root = builder.finish().unwrap();
        let b = root.borrow().get("b").unwrap();
        assert_eq!(b.borrow().child_tags(), vec!["c", "d"]);
    }

    #[test]
    fn test_text_propagates_to_ancestors() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_characters("1").unwrap();
        builder.on_open("b", Attributes::new()).unwrap();
        builder.on_characters("2").unwrap();
        builder.on_open("c", Attributes::new()).unwrap();
        builder.on_characters("3").unwrap();
        builder.on_close("c").unwrap();
        builder.on_characters("4").unwrap();
        builder.on_close("b").unwrap();
        builder.on_characters("5").unwrap();
        builder.on_close("a").unwrap();

        let a = builder.finish().unwrap();
        let b = a.borrow().get("b").unwrap();
        let c = b.borrow().get("c").unwrap();
        assert_eq!(a.borrow().text(), Some("12345"));
        assert_eq!(b.borrow().text(), Some("234"));
        assert_eq!(c.borrow().text(), Some("3"));
    }

    #[test]
    fn test_strict_mismatch_fails() {
        let mut builder = TreeBuilder::new();
        builder.on_open("x", Attributes::new()).unwrap();
        match builder.on_close("y") {
            Err(Error::StructuralMismatch { expected, found }) => {
                assert_eq!(expected, "x");
                assert_eq!(found, "y");
            }
            other => panic!("Expected StructuralMismatch, got {:?}", other),
        }
        // The receiver did not change.
        assert_eq!(tag_of(builder.current().unwrap()), "x");
    }

    #[test]
    fn test_lenient_mismatch_is_ignored() {
        let mut builder = TreeBuilder::with_policy(MismatchPolicy::Lenient);
        builder.on_open("x", Attributes::new()).unwrap();
        builder.on_open("y", Attributes::new()).unwrap();
        builder.on_close("x").unwrap();
        assert_eq!(tag_of(builder.current().unwrap()), "y");

        builder.on_characters("still y").unwrap();
        builder.on_close("y").unwrap();
        builder.on_close("x").unwrap();
        let root = builder.finish().unwrap();
        assert_eq!(root.borrow().get("y").unwrap().borrow().text(), Some("still y"));
    }

    #[test]
    fn test_events_before_root_are_rejected() {
        let mut builder = TreeBuilder::new();
        assert!(matches!(
            builder.on_characters("stray"),
            Err(Error::ProtocolViolation(_))
        ));
        assert!(matches!(
            builder.on_close("a"),
            Err(Error::ProtocolViolation(_))
        ));
        assert_eq!(builder.state(), BuildState::Unnamed);
    }

    #[test]
    fn test_events_after_root_closed_are_rejected() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_close("a").unwrap();

        for result in [
            builder.on_open("b", Attributes::new()),
            builder.on_characters("late"),
            builder.on_close("a"),
        ] {
            match result {
                Err(Error::ProtocolViolation(msg)) => {
                    assert!(msg.contains("after the root element closed"), "{}", msg)
                }
                other => panic!("Expected ProtocolViolation, got {:?}", other),
            }
        }

        let root = builder.finish().unwrap();
        assert_eq!(root.borrow().child_count(), 0);
        assert_eq!(root.borrow().text(), None);
    }

    #[test]
    fn test_finish_without_root() {
        assert!(matches!(
            TreeBuilder::new().finish(),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn test_finish_with_open_elements() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_open("b", Attributes::new()).unwrap();
        match builder.finish() {
            Err(Error::Unclosed { tag }) => assert_eq!(tag, "b"),
            other => panic!("Expected Unclosed, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_tree_after_failure() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_open("b", Attributes::new()).unwrap();
        builder.on_characters("partial").unwrap();
        assert!(builder.on_close("c").is_err());

        let root = builder.into_partial().unwrap();
        assert_eq!(root.borrow().child_tags(), vec!["b"]);
        assert_eq!(root.borrow().text(), Some("partial"));
        assert!(TreeBuilder::new().into_partial().is_none());
    }

    #[test]
    fn test_child_is_addressable_while_open() {
        let mut builder = TreeBuilder::new();
        builder.on_open("a", Attributes::new()).unwrap();
        builder.on_open("b", id("1")).unwrap();

        let root = builder.root().unwrap();
        let b = root.borrow().child(0).unwrap();
        assert_eq!(b.borrow().attribute("id"), Some("1"));
        assert_eq!(b.borrow().index_in_parent(), Some(0));
        assert!(Rc::ptr_eq(&b, builder.current().unwrap()));
    }
}
