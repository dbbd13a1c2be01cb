//! Metadata document parsing
//!
//! Only the parts needed to package a document are read: the root element's
//! local name (the metadata type), and the direct `<fullName>` and `<label>`
//! children. The body itself is kept verbatim.

use crate::error::{CoreError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A parsed metadata payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDocument {
    type_name: String,
    full_name: String,
    label: Option<String>,
    body: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Child {
    FullName,
    Label,
}

impl Child {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "fullName" => Some(Child::FullName),
            "label" => Some(Child::Label),
            _ => None,
        }
    }
}

impl MetadataDocument {
    /// Parse a metadata XML document.
    ///
    /// Fails with [`CoreError::InvalidDocument`] on malformed XML, a missing root
    /// element, or a missing/empty `<fullName>`.
    pub fn parse(body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        let (type_name, full_name, label) = scan(&body)?;

        let full_name = full_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                CoreError::invalid_document(format!(
                    "<{}> document must contain a <fullName> element",
                    type_name
                ))
            })?;

        Ok(Self {
            type_name,
            full_name,
            label: label.filter(|l| !l.trim().is_empty()),
            body,
        })
    }

    /// Metadata type, e.g. `RemoteSiteSetting`
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The document exactly as it was supplied
    pub fn body(&self) -> &str {
        &self.body
    }
}

type Scanned = (String, Option<String>, Option<String>);

fn scan(body: &str) -> Result<Scanned> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut root: Option<String> = None;
    let mut reading: Option<Child> = None;
    // Only the first occurrence of each child is read
    let mut seen: Vec<Child> = Vec::new();
    let mut full_name: Option<String> = None;
    let mut label: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            CoreError::invalid_document(format!(
                "malformed XML near byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(start) => {
                depth += 1;
                let name = local_name(&start)?;
                match depth {
                    1 => root = Some(name),
                    2 => {
                        reading = Child::from_name(&name).filter(|child| !seen.contains(child));
                        if let Some(child) = reading {
                            seen.push(child);
                        }
                    },
                    _ => {},
                }
            },
            Event::Empty(start) if depth == 0 => {
                root = Some(local_name(&start)?);
                break;
            },
            Event::Empty(start) if depth == 1 => {
                if let Some(child) = Child::from_name(&local_name(&start)?) {
                    if !seen.contains(&child) {
                        seen.push(child);
                    }
                }
            },
            Event::Text(text) if depth == 2 => {
                if let Some(child) = reading {
                    let value = text
                        .unescape()
                        .map_err(|e| CoreError::invalid_document(e.to_string()))?;
                    append(child, &value, &mut full_name, &mut label);
                }
            },
            Event::CData(data) if depth == 2 => {
                if let Some(child) = reading {
                    let value = String::from_utf8_lossy(&data);
                    append(child, &value, &mut full_name, &mut label);
                }
            },
            Event::End(_) => {
                if depth == 2 {
                    reading = None;
                }
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    break;
                }
            },
            Event::Eof => {
                if depth > 0 {
                    return Err(CoreError::invalid_document(
                        "document ended before the root element was closed",
                    ));
                }
                break;
            },
            _ => {},
        }
    }

    let root = root.ok_or_else(|| CoreError::invalid_document("no root element found"))?;
    Ok((root, full_name, label))
}

fn append(child: Child, value: &str, full_name: &mut Option<String>, label: &mut Option<String>) {
    let slot = match child {
        Child::FullName => full_name,
        Child::Label => label,
    };
    slot.get_or_insert_with(String::new).push_str(value);
}

fn local_name(start: &BytesStart<'_>) -> Result<String> {
    let local = start.local_name();
    std::str::from_utf8(local.as_ref())
        .map(str::to_string)
        .map_err(|e| CoreError::invalid_document(format!("element name is not UTF-8: {}", e)))
}
