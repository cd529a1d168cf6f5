//! XML input.
//!
//! Markup scanning is done by quick-xml. [`XmlParser`] drives its reader and
//! forwards each element start, element end and run of character data to an
//! [`EventSink`](crate::EventSink), normally a [`TreeBuilder`](crate::TreeBuilder).

mod parser;

pub use parser::{parse_file, parse_str, XmlParser};
