//! Element Tree - build navigable XML trees from streaming parse events
//!
//! This library turns the open/characters/close events of an XML tokenizer
//! into a tree of elements while the document is still being read.
//!
//! # Overview
//!
//! Each element becomes able to receive events as soon as its start tag is
//! seen and stops receiving them when its end tag arrives. While open, it
//! collects the character data of its whole subtree, so an element's text is
//! everything nested inside it, in document order.
//!
//! Children can be looked up by position, or by tag through a per-element
//! index that groups same-tag children in document order.
//!
//! # Example
//!
//! ```
//! use element_tree::{parse_str, Parts};
//!
//! let root = parse_str(r#"<a><b id="1">hi</b><b id="2"/></a>"#).unwrap();
//! let a = root.borrow();
//!
//! assert_eq!(a.text(), Some("hi"));
//! assert_eq!(a.get("b").unwrap().borrow().attribute("id"), Some("1"));
//! assert_eq!(a.select("b", Parts::All).unwrap().len(), 2);
//! assert!(a.get("missing").is_none());
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod node;
pub mod options;
pub mod xml;

// Re-export commonly used types
pub use builder::{BuildState, TreeBuilder};
pub use error::{Error, Result};
pub use event::{replay, Event, EventLog, EventSink};
pub use node::{new_element, Attributes, ElementInner, ElementRef, Parts, WeakElementRef};
pub use options::{MismatchPolicy, ParseOptions};
pub use xml::{parse_file, parse_str, XmlParser};
