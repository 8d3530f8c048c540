use std::io::{self, Cursor};

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use zip::ZipArchive;

use super::{ExtractionError, FormatHandler};

pub struct DocxHandler;

impl FormatHandler for DocxHandler {
    fn label(&self) -> &'static str {
        "DOCX"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".docx"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(body_paragraphs(bytes)?.join("\n\n"))
    }
}

/// Text of each top-level body paragraph, in document order. Paragraphs
/// inside tables are not included.
pub fn body_paragraphs(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    check_package(bytes)?;
    let docx = docx_rs::read_docx(bytes)?;
    let paragraphs = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => {
                let mut text = String::new();
                push_paragraph_text(&paragraph.children, &mut text);
                Some(text)
            }
            _ => None,
        })
        .collect();
    Ok(paragraphs)
}

/// Decompress every part once so damaged entries come back as errors.
/// `read_docx` unwraps its zip reads and would panic on them instead.
fn check_package(bytes: &[u8]) -> Result<(), ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        io::copy(&mut entry, &mut io::sink())?;
    }
    Ok(())
}

fn push_paragraph_text(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, out),
            _ => {}
        }
    }
}
