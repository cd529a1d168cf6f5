//! XML tokenizer driver that feeds element trees.
//!
//! quick-xml's pull reader scans the markup; this driver turns each of its
//! events into an open, characters or close call on an [`EventSink`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::builder::TreeBuilder;
use crate::error::{Error, Result};
use crate::event::EventSink;
use crate::node::{Attributes, ElementRef};
use crate::options::ParseOptions;

/// XML parser that builds element trees.
#[derive(Debug, Clone, Default)]
pub struct XmlParser {
    options: ParseOptions,
}

impl XmlParser {
    /// Creates a new parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        XmlParser { options }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<ElementRef> {
        let mut builder = self.builder();
        self.stream_str(xml, &mut builder)?;
        builder.finish()
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<ElementRef> {
        let mut builder = self.builder();
        self.stream_file(path, &mut builder)?;
        builder.finish()
    }

    /// Parses XML from any buffered source.
    pub fn parse_reader<R: BufRead>(&self, source: R) -> Result<ElementRef> {
        let mut reader = self.reader(source);
        let mut builder = self.builder();
        self.begin_parse(&mut reader, &mut builder)?;
        builder.finish()
    }

    /// Feeds the events of an XML string into a sink.
    pub fn stream_str<S: EventSink + ?Sized>(&self, xml: &str, sink: &mut S) -> Result<()> {
        let mut reader = self.reader(xml.as_bytes());
        self.begin_parse(&mut reader, sink)
    }

    /// Feeds the events of an XML file into a sink.
    pub fn stream_file<P, S>(&self, path: P, sink: &mut S) -> Result<()>
    where
        P: AsRef<Path>,
        S: EventSink + ?Sized,
    {
        let file = File::open(path)?;
        let mut reader = self.reader(BufReader::new(file));
        self.begin_parse(&mut reader, sink)
    }

    /// Creates a builder configured from these options.
    pub fn builder(&self) -> TreeBuilder {
        TreeBuilder::with_policy(self.options.mismatch_policy)
    }

    /// Creates a quick-xml reader configured for tree building.
    pub fn reader<R: BufRead>(&self, source: R) -> Reader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        // Character data is delivered verbatim; whitespace handling is ours
        config.trim_text_start = false;
        config.trim_text_end = false;
        // Close names are checked by the builder, under its mismatch policy,
        // so stray closes must reach it too
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        reader
    }

    /// Scans the whole input, delivering every event to `sink`.
    ///
    /// Returns when the reader reaches end of input or at the first error,
    /// whether raised by the tokenizer or by the sink.
    pub fn begin_parse<R, S>(&self, reader: &mut Reader<R>, sink: &mut S) -> Result<()>
    where
        R: BufRead,
        S: EventSink + ?Sized,
    {
        debug!(options = ?self.options, "starting parse");
        // quick-xml splits a text run at every reference; the pieces are
        // joined here and flushed at the next element boundary
        let mut current_text = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    self.flush_text(&mut current_text, sink)?;
                    let (name, attributes) = self.parse_element(e, reader)?;
                    sink.open(&name, attributes)?;
                }
                Event::End(ref e) => {
                    self.flush_text(&mut current_text, sink)?;
                    let name = reader
                        .decoder()
                        .decode(e.name().as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))?
                        .to_string();
                    sink.close(&name)?;
                }
                Event::Empty(ref e) => {
                    // Self-closing tag - handle like Start + End
                    self.flush_text(&mut current_text, sink)?;
                    let (name, attributes) = self.parse_element(e, reader)?;
                    sink.open(&name, attributes)?;
                    sink.close(&name)?;
                }
                Event::Text(e) => {
                    let raw = decode_utf8(e.as_ref())?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    current_text.push_str(&text);
                }
                Event::GeneralRef(ref e) => {
                    current_text.push_str(&resolve_reference(e)?);
                }
                Event::CData(ref e) => {
                    if self.options.cdata_as_text {
                        current_text.push_str(decode_utf8(e.as_ref())?);
                    }
                }
                Event::Eof => {
                    self.flush_text(&mut current_text, sink)?;
                    break;
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }

        debug!(position = reader.buffer_position(), "reached end of input");
        Ok(())
    }

    /// Parses an element's name and attributes.
    fn parse_element<R: BufRead>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
    ) -> Result<(String, Attributes)> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut attributes = Attributes::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            attributes.insert(key, value);
        }

        Ok((name, attributes))
    }

    /// Delivers the buffered text run unless it is ignorable whitespace.
    ///
    /// Whitespace outside the root element is always ignorable; inside it,
    /// only when `ignore_whitespace` is set.
    fn flush_text<S: EventSink + ?Sized>(&self, text: &mut String, sink: &mut S) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let blank = text.trim().is_empty();
        let result = if blank && (sink.depth() == 0 || self.options.ignore_whitespace) {
            Ok(())
        } else {
            sink.characters(text.as_str())
        };
        text.clear();
        result
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Parse(e.to_string()))
}

/// Resolves `&name;`, `&#nn;` and `&#xhh;` references to their text.
fn resolve_reference(e: &BytesRef) -> Result<String> {
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|err| Error::Parse(err.to_string()))?
    {
        return Ok(ch.to_string());
    }
    let name = e.decode().map_err(|err| Error::Parse(err.to_string()))?;
    resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| Error::Parse(format!("unknown entity reference &{};", name)))
}

/// Parses XML from a file with default options.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ElementRef> {
    XmlParser::default().parse_file(path)
}

/// Parses XML from a string with default options.
pub fn parse_str(xml: &str) -> Result<ElementRef> {
    XmlParser::default().parse_str(xml)
}
