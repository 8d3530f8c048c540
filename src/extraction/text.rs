use super::{ExtractionError, FormatHandler};

pub struct TextHandler;

impl FormatHandler for TextHandler {
    fn label(&self) -> &'static str {
        "TXT"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &[".txt"]
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
