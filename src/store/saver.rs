use std::fs;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::error::{ConfigError, Result};
use super::snapshot::{KEY_DELIMITER, MAX_DEPTH, Snapshot};

const INDENT_CHAR: u8 = b' ';
const INDENT_SIZE: usize = 2;

/// Intermediate element tree rebuilt from the flat key paths.
struct Node {
    name: String,
    children: Vec<Node>,
    value: Option<Option<String>>,
    raw_block: bool,
}

impl Node {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            children: Vec::new(),
            value: None,
            raw_block: false,
        }
    }

    /// Returns the child with the given name, creating it on first use.
    /// Sibling entries sharing a path prefix end up under one element.
    fn child_mut(&mut self, name: &str) -> &mut Node {
        let normalized = name.to_lowercase();
        let index = match self
            .children
            .iter()
            .position(|c| c.name.to_lowercase() == normalized)
        {
            Some(index) => index,
            None => {
                self.children.push(Node::new(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }
}

/// Renders a snapshot as a nested configuration document.
///
/// Entries are visited in insertion order, so the element order of the
/// output follows the history of the snapshot rather than any sorting.
/// Raw-block values are emitted as CDATA sections, everything else as
/// escaped text; an absent value serializes as the empty string.
pub(crate) fn render(snapshot: &Snapshot) -> Result<Vec<u8>> {
    let mut root = Node::new(snapshot.root_name());

    for entry in snapshot.iter() {
        let segments: Vec<&str> = entry.key.split(KEY_DELIMITER).collect();
        if segments.len() >= MAX_DEPTH {
            return Err(ConfigError::InvalidConfiguration {
                details: format!("key '{}' nests deeper than {MAX_DEPTH} levels", entry.key),
            });
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidConfiguration {
                details: format!("key '{}' contains an empty segment", entry.key),
            });
        }
        if entry.raw_block && entry.value.as_deref().is_some_and(|v| v.contains("]]>")) {
            return Err(ConfigError::InvalidConfiguration {
                details: format!("raw value for key '{}' contains the CDATA terminator", entry.key),
            });
        }

        let mut node = &mut root;
        for segment in &segments {
            node = node.child_mut(segment);
        }
        node.value = Some(entry.value.clone());
        node.raw_block = entry.raw_block;
    }

    let mut writer = Writer::new_with_indent(Vec::new(), INDENT_CHAR, INDENT_SIZE);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;
    write_node(&mut writer, &root)?;
    Ok(writer.into_inner())
}

/// Renders the snapshot and writes it to `path`, creating the parent
/// directory when missing.
pub(crate) fn write_to_file(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let document = render(snapshot)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, &e))?;
        }
    }
    fs::write(path, document).map_err(|e| io_error(path, &e))
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(node.name.as_str())))
        .map_err(write_error)?;

    if node.children.is_empty() {
        let value = node.value.clone().flatten().unwrap_or_default();
        if node.raw_block {
            writer
                .write_event(Event::CData(BytesCData::new(value.as_str())))
                .map_err(write_error)?;
        } else {
            // An empty text event keeps childless elements on one line.
            writer
                .write_event(Event::Text(BytesText::new(value.as_str())))
                .map_err(write_error)?;
        }
    } else {
        // A value addressed by a prefix of another key has no element of its
        // own to live in; the child elements win.
        for child in &node.children {
            write_node(writer, child)?;
        }
    }

    writer
        .write_event(Event::End(BytesEnd::new(node.name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

fn write_error<E: std::fmt::Display>(error: E) -> ConfigError {
    ConfigError::Format {
        details: format!("failed to serialize document: {error}"),
    }
}

fn io_error(path: &Path, error: &std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.to_path_buf(),
        details: error.to_string(),
    }
}
