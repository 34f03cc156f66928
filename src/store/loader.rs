use quick_xml::Reader;
use quick_xml::events::Event;

use super::error::{ConfigError, Result};
use super::snapshot::{KEY_DELIMITER, MAX_DEPTH, Snapshot};

/// One element currently open during the document walk.
struct Frame {
    /// Key path of this element, empty for the root.
    path: String,
    text: String,
    has_children: bool,
    saw_cdata: bool,
}

/// Parses a whole configuration document into a snapshot.
///
/// The outermost element names the snapshot root. Every element without
/// element children becomes one entry, keyed by the delimiter-joined chain
/// of element names below the root; its value is the element's full text
/// content. CDATA content marks the entry as a raw block so the next save
/// reproduces it unescaped. Elements with element children only contribute
/// a path segment.
///
/// The walk is iterative over the parser's event stream, so document depth
/// is bounded by [`MAX_DEPTH`] rather than the call stack.
pub(crate) fn parse_document(input: &str) -> Result<Snapshot> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().expand_empty_elements = true;

    let mut snapshot: Option<Snapshot> = None;
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format_error(&reader, &e))?;

        match event {
            Event::Start(start) => {
                let name = decode(&reader, start.local_name().as_ref())?;
                if stack.len() >= MAX_DEPTH {
                    return Err(ConfigError::Format {
                        details: format!("element nesting deeper than {MAX_DEPTH} levels"),
                    });
                }

                let path = match stack.last_mut() {
                    None => {
                        if snapshot.is_some() {
                            return Err(ConfigError::Format {
                                details: "document has more than one root element".to_string(),
                            });
                        }
                        snapshot = Some(Snapshot::new(name));
                        String::new()
                    }
                    Some(parent) => {
                        parent.has_children = true;
                        if parent.path.is_empty() {
                            name
                        } else {
                            format!("{}{KEY_DELIMITER}{name}", parent.path)
                        }
                    }
                };

                stack.push(Frame {
                    path,
                    text: String::new(),
                    has_children: false,
                    saw_cdata: false,
                });
            }

            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(ConfigError::Format {
                        details: "unexpected closing tag".to_string(),
                    });
                };

                // The root itself never becomes an entry.
                if stack.is_empty() || frame.has_children {
                    continue;
                }

                let Some(snapshot) = snapshot.as_mut() else {
                    continue;
                };
                if !snapshot.insert_new(&frame.path, Some(frame.text), frame.saw_cdata) {
                    return Err(ConfigError::Format {
                        details: format!("duplicate key '{}' in document", frame.path),
                    });
                }
            }

            Event::Text(text) => {
                let content = text.unescape().map_err(|e| format_error(&reader, &e))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&content),
                    None if content.trim().is_empty() => {}
                    None => {
                        return Err(ConfigError::Format {
                            details: "text content outside of the root element".to_string(),
                        });
                    }
                }
            }

            Event::CData(data) => {
                let bytes = data.into_inner();
                let content = decode(&reader, bytes.as_ref())?;
                match stack.last_mut() {
                    Some(frame) => {
                        frame.saw_cdata = true;
                        frame.text.push_str(&content);
                    }
                    None => {
                        return Err(ConfigError::Format {
                            details: "CDATA content outside of the root element".to_string(),
                        });
                    }
                }
            }

            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)
            | Event::Empty(_) => {}

            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        return Err(ConfigError::Format {
            details: "unexpected end of document".to_string(),
        });
    }

    snapshot.ok_or_else(|| ConfigError::Format {
        details: "document has no root element".to_string(),
    })
}

fn decode(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| ConfigError::Format {
            details: e.to_string(),
        })
}

fn format_error(reader: &Reader<&[u8]>, error: &impl std::fmt::Display) -> ConfigError {
    ConfigError::Format {
        details: format!("{error} at byte {}", reader.buffer_position()),
    }
}
