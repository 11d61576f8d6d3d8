//! Error types for folio operations.

use thiserror::Error;

/// Errors that can occur while loading, paginating, or addressing a document.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("progress file error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("document has no readable content")]
    EmptyDocument,

    #[error("invalid geometry {columns}x{rows}: columns and rows must be positive")]
    InvalidGeometry { columns: usize, rows: usize },

    #[error("chapter {chapter} out of range: document has {count} chapters")]
    ChapterOutOfRange { chapter: usize, count: usize },

    #[error("page {page} out of range: document has {count} pages")]
    PageOutOfRange { page: usize, count: usize },

    #[error("percent {0} out of range: expected a value in 0..=100")]
    InvalidPercent(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
