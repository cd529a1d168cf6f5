//! Read-only child lookups.

use std::rc::Rc;

use super::{ElementInner, ElementRef};
use crate::error::{Error, Result};

/// Which members of a tag group a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parts {
    /// Every child with the tag, in document order.
    All,
    /// The first child with the tag.
    First,
    /// The last child with the tag.
    Last,
}

impl ElementInner {
    /// Returns the child at `index` in document order.
    pub fn child(&self, index: usize) -> Result<ElementRef> {
        self.children
            .get(index)
            .cloned()
            .ok_or(Error::IndexOutOfBounds {
                index,
                len: self.children.len(),
            })
    }

    /// Returns the first child with the given tag, if any.
    pub fn get(&self, tag: &str) -> Option<ElementRef> {
        self.children_by_tag
            .get(tag)
            .and_then(|group| group.first())
            .cloned()
    }

    /// Returns true if at least one child has the given tag.
    pub fn has_child(&self, tag: &str) -> bool {
        self.children_by_tag.contains_key(tag)
    }

    /// Returns children with the given tag.
    ///
    /// Unlike [`get`](Self::get), a tag with no children is an error here;
    /// check with `get` or [`has_child`](Self::has_child) first when the tag
    /// may be absent.
    pub fn select(&self, tag: &str, parts: Parts) -> Result<Vec<ElementRef>> {
        let group = self
            .children_by_tag
            .get(tag)
            .filter(|group| !group.is_empty())
            .ok_or_else(|| Error::MissingTag(tag.to_string()))?;

        let selected = match parts {
            Parts::All => group.clone(),
            Parts::First => vec![Rc::clone(&group[0])],
            Parts::Last => vec![Rc::clone(&group[group.len() - 1])],
        };
        Ok(selected)
    }

    /// Follows a `/`-separated path of tags from this element, taking the
    /// first matching child at each level.
    ///
    /// Empty segments are skipped, so `"a//b/"` is the same as `"a/b"`.
    /// A path with no segments returns `None`.
    pub fn find_path(&self, path: &str) -> Option<ElementRef> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            let next = current.borrow().get(segment)?;
            current = next;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{new_element, Attributes};

    fn element_with_id(tag: &str, id: &str) -> ElementRef {
        let mut attributes = Attributes::new();
        attributes.insert("id".to_string(), id.to_string());
        new_element(tag, attributes)
    }

    fn id_of(el: &ElementRef) -> String {
        el.borrow().attribute("id").unwrap_or_default().to_string()
    }

    /// <list><item id=1/><note id=2/><item id=3/><item id=4/></list>
    fn sample() -> ElementRef {
        let list = new_element("list", Attributes::new());
        for (tag, id) in [("item", "1"), ("note", "2"), ("item", "3"), ("item", "4")] {
            ElementInner::add_child_to_ref(&list, element_with_id(tag, id));
        }
        list
    }

    #[test]
    fn test_child_by_index() {
        let list = sample();
        let list = list.borrow();
        assert_eq!(id_of(&list.child(0).unwrap()), "1");
        assert_eq!(id_of(&list.child(3).unwrap()), "4");

        match list.child(4) {
            Err(Error::IndexOutOfBounds { index, len }) => {
                assert_eq!(index, 4);
                assert_eq!(len, 4);
            }
            other => panic!("Expected IndexOutOfBounds, got {:?}", other),
        }
    }

    #[test]
    fn test_get_returns_first() {
        let list = sample();
        let list = list.borrow();
        assert_eq!(id_of(&list.get("item").unwrap()), "1");
        assert_eq!(id_of(&list.get("note").unwrap()), "2");
        assert!(list.get("missing").is_none());
        assert!(list.has_child("note"));
        assert!(!list.has_child("missing"));
    }

    #[test]
    fn test_select_parts() {
        let list = sample();
        let list = list.borrow();

        let all: Vec<String> = list
            .select("item", Parts::All)
            .unwrap()
            .iter()
            .map(id_of)
            .collect();
        assert_eq!(all, vec!["1", "3", "4"]);

        let first = list.select("item", Parts::First).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(id_of(&first[0]), "1");

        let last = list.select("item", Parts::Last).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(id_of(&last[0]), "4");
    }

    #[test]
    fn test_select_missing_tag_fails() {
        let list = sample();
        let list = list.borrow();
        for parts in [Parts::All, Parts::First, Parts::Last] {
            assert!(matches!(
                list.select("missing", parts),
                Err(Error::MissingTag(tag)) if tag == "missing"
            ));
        }
    }

    #[test]
    fn test_find_path() {
        let root = new_element("root", Attributes::new());
        let a = new_element("a", Attributes::new());
        let b1 = element_with_id("b", "first");
        let b2 = element_with_id("b", "second");
        ElementInner::add_child_to_ref(&root, a.clone());
        ElementInner::add_child_to_ref(&a, b1);
        ElementInner::add_child_to_ref(&a, b2);

        let root = root.borrow();
        assert!(Rc::ptr_eq(&root.find_path("a").unwrap(), &a));
        assert_eq!(id_of(&root.find_path("a/b").unwrap()), "first");
        assert_eq!(id_of(&root.find_path("/a//b/").unwrap()), "first");
        assert!(root.find_path("a/c").is_none());
        assert!(root.find_path("").is_none());
    }

    #[test]
    fn test_lookups_are_repeatable() {
        let list = sample();
        let list = list.borrow();
        let first = list.select("item", Parts::All).unwrap();
        let second = list.select("item", Parts::All).unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert!(Rc::ptr_eq(a, b));
        }
        assert!(Rc::ptr_eq(
            &list.get("item").unwrap(),
            &list.get("item").unwrap()
        ));
    }
}
