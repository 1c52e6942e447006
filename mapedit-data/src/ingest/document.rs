//! Streaming extraction of the first `osm/way` element.

use std::borrow::Cow;

use mapedit_core::TagCandidate;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::IngestError;

/// Attributes and children of a `way` element, still as raw text.
#[derive(Debug, Default)]
pub(crate) struct RawWay {
    pub(crate) id: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) changeset: Option<String>,
    /// `ref` of each `nd` child in document order; `None` when absent.
    pub(crate) node_refs: Vec<Option<String>>,
    pub(crate) tags: Vec<TagCandidate>,
}

/// Read the first `way` directly below the `osm` root.
///
/// Elements other than `nd` and `tag` inside the way are skipped, as are
/// ways nested anywhere else.
pub(crate) fn read_first_way(text: &str) -> Result<RawWay, IngestError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut way: Option<RawWay> = None;

    loop {
        match reader.read_event().map_err(IngestError::MalformedXml)? {
            Event::Start(element) => {
                let name = element.name().as_ref().to_vec();
                visit(&element, &open, &mut way)?;
                open.push(name);
            }
            Event::Empty(element) => {
                visit(&element, &open, &mut way)?;
                if way.is_some() && is_way_position(&open) && element.name().as_ref() == b"way" {
                    break;
                }
            }
            Event::End(_) => {
                let closed = open.pop();
                let way_closed = closed.as_deref() == Some(b"way".as_slice());
                if way.is_some() && way_closed && is_way_position(&open) {
                    break;
                }
            }
            Event::Eof => {
                if way.is_some() {
                    return Err(IngestError::MalformedXml(quick_xml::Error::UnexpectedEof(
                        "way".to_owned(),
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    way.ok_or(IngestError::MissingWay)
}

fn is_way_position(open: &[Vec<u8>]) -> bool {
    matches!(open, [root] if root.as_slice() == b"osm")
}

fn visit(
    element: &BytesStart<'_>,
    open: &[Vec<u8>],
    way: &mut Option<RawWay>,
) -> Result<(), IngestError> {
    let name = element.name();
    if way.is_none() {
        if name.as_ref() == b"way" && is_way_position(open) {
            *way = Some(RawWay {
                id: attribute(element, b"id")?,
                version: attribute(element, b"version")?,
                changeset: attribute(element, b"changeset")?,
                ..RawWay::default()
            });
        }
        return Ok(());
    }
    if let Some(raw) = way.as_mut().filter(|_| is_child_position(open)) {
        match name.as_ref() {
            b"nd" => raw.node_refs.push(attribute(element, b"ref")?),
            b"tag" => raw.tags.push(TagCandidate {
                key: attribute(element, b"k")?,
                value: attribute(element, b"v")?,
            }),
            _ => {}
        }
    }
    Ok(())
}

fn is_child_position(open: &[Vec<u8>]) -> bool {
    matches!(open, [root, way] if root.as_slice() == b"osm" && way.as_slice() == b"way")
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, IngestError> {
    for entry in element.attributes() {
        let attribute =
            entry.map_err(|err| IngestError::MalformedXml(quick_xml::Error::InvalidAttr(err)))?;
        if attribute.key.as_ref() == key {
            let value: Cow<'_, str> = attribute
                .unescape_value()
                .map_err(IngestError::MalformedXml)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
