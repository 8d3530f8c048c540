use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::{ExtractionError, FormatHandler};

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

pub struct PptxHandler;

impl FormatHandler for PptxHandler {
    fn label(&self) -> &'static str {
        "PowerPoint"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".pptx"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let slides = slide_parts(&mut archive)?;
        debug!(slide_count = slides.len(), "Extracting presentation");

        let mut out = String::new();
        for part in slides {
            let xml = read_part(&mut archive, &part)?;
            for text in shape_texts(&xml)? {
                out.push_str(&text);
                out.push('\n');
            }
            out.push('\n');
        }

        Ok(out)
    }
}

/// Slide part names in presentation order (`p:sldIdLst`).
fn slide_parts<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>, ExtractionError> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let relationship_ids = slide_relationship_ids(&presentation)?;

    let rels = read_part(archive, PRESENTATION_RELS)?;
    let targets = relationship_targets(&rels)?;

    relationship_ids
        .iter()
        .map(|id| {
            targets
                .get(id)
                .map(|target| resolve_target(target))
                .ok_or_else(|| ExtractionError::malformed(format!("no relationship named {}", id)))
        })
        .collect()
}

fn slide_relationship_ids(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = prefixed_attribute(&e, b"id")? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

/// Value of a namespaced attribute such as `r:id`, skipping the plain `id`.
fn prefixed_attribute(e: &BytesStart<'_>, local: &[u8]) -> Result<Option<String>, ExtractionError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == local {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target),
    }
}

/// Text of each top-level shape (`p:sp` directly under `p:spTree`). A shape
/// without a text body has empty text. Group members, pictures, connectors
/// and graphic frames carry no text of their own.
fn shape_texts(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut shape: Option<ShapeText> = None;
    let mut texts = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"sp" && stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice()) {
                    shape = Some(ShapeText::default());
                } else if let Some(current) = shape.as_mut() {
                    current.open(&name, &stack);
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"sp"
                    && stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice())
                {
                    texts.push(String::new());
                } else if let Some(current) = shape.as_mut() {
                    let name = e.local_name().as_ref().to_vec();
                    current.open(&name, &stack);
                    if name == b"br" {
                        current.push_text("\n");
                    }
                }
            }
            Event::Text(e) => {
                if let Some(current) = shape.as_mut() {
                    if stack.last().map(Vec::as_slice) == Some(b"t".as_slice()) && in_text_body(&stack) {
                        current.push_text(&e.unescape()?);
                    }
                }
            }
            Event::End(e) => {
                stack.pop();
                if e.local_name().as_ref() == b"sp"
                    && stack.last().map(Vec::as_slice) == Some(b"spTree".as_slice())
                {
                    if let Some(done) = shape.take() {
                        texts.push(done.paragraphs.join("\n"));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(texts)
}

fn in_text_body(stack: &[Vec<u8>]) -> bool {
    stack.iter().any(|name| name == b"txBody")
}

#[derive(Default)]
struct ShapeText {
    paragraphs: Vec<String>,
}

impl ShapeText {
    fn open(&mut self, name: &[u8], stack: &[Vec<u8>]) {
        if name == b"p" && in_text_body(stack) {
            self.paragraphs.push(String::new());
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = self.paragraphs.last_mut() {
            paragraph.push_str(text);
        }
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, ExtractionError> {
    let mut file = archive.by_name(name)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}
