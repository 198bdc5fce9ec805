//! XML decoding for mapper files.
//!
//! Built on the `quick-xml` event reader. The decoder only understands the
//! shape it needs: one root element, statement children named after a
//! [`StatementKind`], and an `id` attribute on each statement. Any other child
//! of the root is skipped with its whole subtree.
//!
//! Statement bodies are the concatenated text and CDATA content of the
//! element, XML-unescaped and trimmed. Markup nested inside a body is dropped
//! but its text is kept.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::path::Path;
use tracing::debug;

use super::{MapperDocument, Statement, StatementKind};
use crate::core::RegistryError;

/// Statement currently being collected.
struct OpenStatement {
    kind: StatementKind,
    id: String,
    body: String,
}

/// Decode raw mapper markup.
///
/// # Errors
///
/// Returns [`RegistryError::Decode`] when the markup is malformed, when there is
/// no root element or more than one, or when a statement lacks an `id`.
pub fn decode(raw: &str) -> Result<MapperDocument, RegistryError> {
    decode_named(raw, "<memory>")
}

/// Read and decode the mapper file at `path`.
///
/// # Errors
///
/// Returns [`RegistryError::Io`] if the file cannot be read, or
/// [`RegistryError::Decode`] if its content is malformed.
pub async fn decode_file(path: &Path) -> Result<MapperDocument, RegistryError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document = decode_named(&raw, &path.display().to_string())?;
    debug!("Decoded {} statement(s) from {}", document.len(), path.display());
    Ok(document)
}

fn decode_named(raw: &str, source_name: &str) -> Result<MapperDocument, RegistryError> {
    let fail = |message: String| RegistryError::Decode {
        source_name: source_name.to_string(),
        message,
    };

    let mut reader = Reader::from_str(raw);
    let mut document = MapperDocument::default();
    let mut depth = 0usize;
    let mut root_seen = false;
    let mut open: Option<OpenStatement> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            fail(format!("{e} at byte {}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                if depth == 0 {
                    if root_seen {
                        return Err(fail("multiple root elements".to_string()));
                    }
                    root_seen = true;
                } else if depth == 1 {
                    if let Some(kind) = StatementKind::from_tag(start.name().as_ref()) {
                        open = Some(OpenStatement {
                            kind,
                            id: statement_id(&start, kind).map_err(&fail)?,
                            body: String::new(),
                        });
                    }
                }
                depth += 1;
            }
            Event::Empty(start) => {
                if depth == 0 {
                    if root_seen {
                        return Err(fail("multiple root elements".to_string()));
                    }
                    root_seen = true;
                } else if depth == 1 {
                    if let Some(kind) = StatementKind::from_tag(start.name().as_ref()) {
                        document.push(Statement {
                            id: statement_id(&start, kind).map_err(&fail)?,
                            kind,
                            body: String::new(),
                        });
                    }
                }
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| fail("unexpected closing tag".to_string()))?;
                if depth == 1 {
                    if let Some(statement) = open.take() {
                        document.push(Statement {
                            id: statement.id,
                            kind: statement.kind,
                            body: statement.body.trim().to_string(),
                        });
                    }
                }
            }
            Event::Text(text) => {
                if let Some(statement) = open.as_mut() {
                    let text = text.unescape().map_err(|e| fail(e.to_string()))?;
                    statement.body.push_str(&text);
                } else if depth == 0 && !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(fail("text outside of the root element".to_string()));
                }
            }
            Event::CData(data) => {
                if let Some(statement) = open.as_mut() {
                    let text = std::str::from_utf8(&data).map_err(|e| fail(e.to_string()))?;
                    statement.body.push_str(text);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if depth != 0 {
        return Err(fail("unexpected end of document inside an element".to_string()));
    }
    if !root_seen {
        return Err(fail("missing root element".to_string()));
    }

    Ok(document)
}

fn statement_id(start: &BytesStart<'_>, kind: StatementKind) -> Result<String, String> {
    let attribute = start
        .try_get_attribute("id")
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("<{kind}> element is missing the id attribute"))?;

    attribute
        .unescape_value()
        .map(|value| value.into_owned())
        .map_err(|e| e.to_string())
}
