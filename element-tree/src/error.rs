//! Error types for element-tree.

use thiserror::Error;

/// Result type alias for element-tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or reading an element tree.
#[derive(Error, Debug)]
pub enum Error {
    /// A close event named a different element than the one currently open.
    #[error("mismatched close tag: expected </{expected}>, found </{found}>")]
    StructuralMismatch {
        /// Tag of the element that is currently receiving events.
        expected: String,
        /// Name carried by the close event.
        found: String,
    },

    /// An event arrived when the builder could not accept it.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Positional child lookup past the end of the child list.
    #[error("child index {index} out of bounds (element has {len} children)")]
    IndexOutOfBounds {
        /// Requested position.
        index: usize,
        /// Number of children the element has.
        len: usize,
    },

    /// Group lookup for a tag with no matching children.
    #[error("no child element with tag <{0}>")]
    MissingTag(String),

    /// The event stream ended before any element was opened.
    #[error("document contains no root element")]
    EmptyDocument,

    /// The event stream ended while elements were still open.
    #[error("element <{tag}> was never closed")]
    Unclosed {
        /// Innermost element still open.
        tag: String,
    },

    /// Tokenizer-level problem (encoding, attributes, entities).
    #[error("XML parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
