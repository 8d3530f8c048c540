//! Document text extraction
//!
//! Routes raw bytes to a format handler chosen by file extension:
//! - `.pdf` - page text in page order
//! - `.docx` / `.doc` - Word paragraphs / legacy Word raw text
//! - `.txt` - lenient UTF-8
//! - `.csv`, `.xls`, `.xlsx` - rendered tables
//! - `.pptx` - slide shape text
//! - `.html`, `.htm` - visible text
//!
//! Handlers return `Result<String, ExtractionError>`. The dispatcher turns a
//! handler error, or a panic raised by a parsing library, into a successful
//! text payload so callers always get text back for bad input; only failures
//! outside a handler's own scope surface as [`ExtractionResult::Error`].

pub mod csv;
pub mod doc;
pub mod docx;
pub mod excel;
pub mod html;
pub mod pdf;
pub mod pptx;
pub mod table;
pub mod text;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

pub const IMAGE_NOT_SUPPORTED: &str = "Image processing is not supported in this version.";

pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".bmp", ".gif", ".tiff"];

/// Outcome of one extraction: exactly one of text or error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionResult {
    Text(String),
    Error(String),
}

impl ExtractionResult {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractionResult::Text(text) => Some(text),
            ExtractionResult::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ExtractionResult::Error(_))
    }
}

/// Failure raised by a single format handler.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Docx(#[from] docx_rs::ReaderError),

    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),

    #[error(transparent)]
    Csv(#[from] ::csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Malformed(String),
}

impl ExtractionError {
    pub fn malformed(message: impl Into<String>) -> Self {
        ExtractionError::Malformed(message.into())
    }
}

/// Failure outside any handler's own scope.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// A stateless converter from the bytes of one format family to text.
pub trait FormatHandler: Send + Sync {
    /// Name used in "Error extracting text from <label>: ..." messages.
    fn label(&self) -> &'static str;

    /// Lower-cased extensions, leading dot included.
    fn extensions(&self) -> &'static [&'static str];

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

#[derive(Clone, Copy)]
enum Route {
    Parse(&'static dyn FormatHandler),
    Image,
}

static HANDLERS: &[&dyn FormatHandler] = &[
    &pdf::PdfHandler,
    &docx::DocxHandler,
    &doc::DocHandler,
    &text::TextHandler,
    &csv::CsvHandler,
    &excel::ExcelHandler,
    &pptx::PptxHandler,
    &html::HtmlHandler,
];

static ROUTES: Lazy<HashMap<&'static str, Route>> = Lazy::new(|| {
    let mut routes = HashMap::new();
    for handler in HANDLERS {
        for ext in handler.extensions() {
            let previous = routes.insert(*ext, Route::Parse(*handler));
            debug_assert!(previous.is_none(), "extension {} routed twice", ext);
        }
    }
    for ext in IMAGE_EXTENSIONS {
        let previous = routes.insert(*ext, Route::Image);
        debug_assert!(previous.is_none(), "extension {} routed twice", ext);
    }
    routes
});

/// Extensions with a dedicated route, sorted.
pub fn known_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = ROUTES.keys().copied().collect();
    extensions.sort_unstable();
    extensions
}

/// Extract text from `bytes` declared as `extension` (e.g. `".pdf"`).
///
/// Never panics and never fails for malformed input: handler errors come back
/// as `Text("Error extracting text from <FORMAT>: ...")`.
pub fn extract(bytes: &[u8], extension: &str) -> ExtractionResult {
    ExtractionResult::Text(process(bytes, extension))
}

/// Route `bytes` to a handler and return its text or its error message.
pub fn process(bytes: &[u8], extension: &str) -> String {
    let extension = extension.to_lowercase();
    debug!(extension = %extension, size = bytes.len(), "Dispatching extraction");

    match ROUTES.get(extension.as_str()) {
        Some(Route::Parse(handler)) => run_handler(*handler, bytes),
        Some(Route::Image) => IMAGE_NOT_SUPPORTED.to_string(),
        None => format!("Unsupported file format: {}", extension),
    }
}

/// Run extraction on the blocking pool, for callers on an async runtime.
pub async fn extract_blocking(bytes: bytes::Bytes, extension: String) -> ExtractionResult {
    match tokio::task::spawn_blocking(move || extract(&bytes, &extension)).await {
        Ok(result) => result,
        Err(join_err) => {
            let err = DispatchError::Worker(join_err.to_string());
            error!(error = %err, "Extraction worker did not complete");
            ExtractionResult::Error(format!("Error processing file: {}", err))
        }
    }
}

/// Parsing libraries occasionally panic on damaged input; that is still the
/// format's own failure and is reported the same way as an `Err`.
fn run_handler(handler: &dyn FormatHandler, bytes: &[u8]) -> String {
    let message = match panic::catch_unwind(AssertUnwindSafe(|| handler.extract(bytes))) {
        Ok(Ok(text)) => return text,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(format = handler.label(), panic = %message, "Parser panicked");
            message
        }
    };
    warn!(format = handler.label(), error = %message, "Could not parse document");
    format!("Error extracting text from {}: {}", handler.label(), message)
}

/// Lower-cased suffix of `filename`, leading dot included, or `""`.
///
/// Leading dots of the final path component do not start a suffix, so
/// `".bashrc"` has none while `"notes."` has `"."`.
pub fn extension_of(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem_start = name.len() - name.trim_start_matches('.').len();
    match name[stem_start..].rfind('.') {
        Some(idx) => name[stem_start + idx..].to_lowercase(),
        None => String::new(),
    }
}
