use lopdf::Document;
use tracing::debug;

use super::{ExtractionError, FormatHandler};

pub struct PdfHandler;

impl FormatHandler for PdfHandler {
    fn label(&self) -> &'static str {
        "PDF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".pdf"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let doc = Document::load_mem(bytes)?;
        if doc.is_encrypted() {
            return Err(ExtractionError::malformed("file has not been decrypted"));
        }

        // get_pages is keyed by page number, so iteration is page order
        let pages = doc.get_pages();
        debug!(page_count = pages.len(), "Extracting PDF pages");

        let mut page_texts = Vec::with_capacity(pages.len());
        for page_number in pages.keys() {
            page_texts.push(doc.extract_text(&[*page_number])?);
        }

        Ok(page_texts.join("\n\n"))
    }
}
