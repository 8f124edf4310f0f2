//! Conversion of MWS XML responses into a `serde_json::Value` tree.
//!
//! MWS responses are plain element trees, so they are folded into the same
//! shape a JSON API would return and decoded with serde from there:
//!
//! - an element with only text becomes a string, an empty one becomes `null`;
//! - an element with children or attributes becomes an object keyed by the
//!   children's local names (namespace prefixes dropped), attributes keyed
//!   `@name`, mixed text under `$text`;
//! - a repeated child becomes an array.
//!
//! The last rule is where the one-or-many ambiguity comes from: a single
//! `<Order>` is an object, two are an array. See [`crate::types::one_or_many`].

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::MwsError;

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, MwsError> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = format!("@{}", String::from_utf8_lossy(attr.key.local_name().as_ref()));
            let value = attr.unescape_value()?.into_owned();
            fields.insert(key, Value::String(value));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        let Frame {
            name,
            mut fields,
            text,
        } = self;

        let value = if fields.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text)
            }
        } else {
            if !text.is_empty() {
                fields.insert("$text".to_string(), Value::String(text));
            }
            Value::Object(fields)
        };
        (name, value)
    }
}

fn attach(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

/// Parses an XML document and returns the root element's local name and its
/// converted content.
///
/// # Errors
///
/// Returns [`MwsError::Xml`] for malformed XML and [`MwsError::Payload`] if
/// the document has no root element.
pub fn parse_document(xml: &str) -> Result<(String, Value), MwsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::open(&e)?),
            Event::Empty(e) => {
                let (name, value) = Frame::open(&e)?.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.fields, name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    continue;
                };
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.fields, name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or_else(|| MwsError::payload("document", "no root element"))
}
