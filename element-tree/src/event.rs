//! The event contract between a tokenizer and the tree builder.
//!
//! A tokenizer reports three kinds of events: an element opens, character
//! data appears, an element closes. Anything that consumes them implements
//! [`EventSink`]. [`TreeBuilder`](crate::TreeBuilder) turns them into a tree;
//! [`EventLog`] records them so a run can be inspected or replayed.

use std::fmt;

use crate::error::Result;
use crate::node::Attributes;

/// Consumer of tokenizer events.
pub trait EventSink {
    /// An element start with its attributes.
    fn open(&mut self, name: &str, attributes: Attributes) -> Result<()>;

    /// A fragment of character data.
    fn characters(&mut self, text: &str) -> Result<()>;

    /// An element end.
    fn close(&mut self, name: &str) -> Result<()>;

    /// Number of elements the sink currently considers open.
    ///
    /// The tokenizer driver uses this to tell character data inside the
    /// root from whitespace around it.
    fn depth(&self) -> usize;
}

/// An owned tokenizer event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Element start.
    Open {
        /// Element name.
        name: String,
        /// Attributes of the element.
        attributes: Attributes,
    },
    /// Character data.
    Characters(String),
    /// Element end.
    Close(String),
}

impl Event {
    /// Creates an open event with no attributes.
    pub fn open(name: impl Into<String>) -> Self {
        Event::Open {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Creates an open event with the given attributes.
    pub fn open_with<I, K, V>(name: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Event::Open {
            name: name.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Creates a character data event.
    pub fn characters(text: impl Into<String>) -> Self {
        Event::Characters(text.into())
    }

    /// Creates a close event.
    pub fn close(name: impl Into<String>) -> Self {
        Event::Close(name.into())
    }

    /// Sends this event into a sink.
    pub fn deliver<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        match self {
            Event::Open { name, attributes } => sink.open(name, attributes.clone()),
            Event::Characters(text) => sink.characters(text),
            Event::Close(name) => sink.close(name),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Open { name, attributes } => {
                write!(f, "open {}", name)?;
                let mut sorted: Vec<_> = attributes.iter().collect();
                sorted.sort();
                for (key, value) in sorted {
                    write!(f, " {}={:?}", key, value)?;
                }
                Ok(())
            }
            Event::Characters(text) => write!(f, "characters {:?}", text),
            Event::Close(name) => write!(f, "close {}", name),
        }
    }
}

/// A sink that records every event it receives.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
    depth: usize,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consumes the log and returns the recorded events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for EventLog {
    fn open(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        self.events.push(Event::Open {
            name: name.to_string(),
            attributes,
        });
        self.depth += 1;
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.events.push(Event::characters(text));
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.events.push(Event::close(name));
        self.depth = self.depth.saturating_sub(1);
        Ok(())
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

/// Feeds events into a sink in order, stopping at the first error.
pub fn replay<'a, I, S>(events: I, sink: &mut S) -> Result<()>
where
    I: IntoIterator<Item = &'a Event>,
    S: EventSink + ?Sized,
{
    for event in events {
        event.deliver(sink)?;
    }
    Ok(())
}
