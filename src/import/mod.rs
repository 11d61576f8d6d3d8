//! Format adapters: each converts one file format into ordered chapters.
//!
//! Formats live in a flat registry mapping file extensions to adapter
//! functions; adding a format means adding a row, not a type. Unknown
//! extensions fall back to content sniffing: a ZIP magic number selects the
//! EPUB adapter, and anything that looks like text is read as plain text.

mod epub;
mod markdown;
mod text;

pub use epub::{read_epub, read_epub_from_reader};
pub use markdown::read_markdown;
pub use text::read_text;

use std::path::Path;

use crate::document::LoadedDocument;
use crate::error::{Error, Result};

type AdapterFn = fn(&Path) -> Result<LoadedDocument>;

/// Extension -> adapter registry. First match wins.
const ADAPTERS: &[(&str, AdapterFn)] = &[
    ("epub", read_epub as AdapterFn),
    ("md", read_markdown),
    ("markdown", read_markdown),
    ("txt", read_text),
    ("text", read_text),
    ("log", read_text),
];

/// Binary formats we recognize but do not read.
const UNSUPPORTED: &[&str] = &["mobi", "azw", "azw3", "kfx", "pdf", "djvu"];

/// Load a document, picking the adapter by extension or content sniff.
pub fn load_document(path: &Path) -> Result<LoadedDocument> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        let ext = ext.to_ascii_lowercase();
        if let Some((_, adapter)) = ADAPTERS.iter().find(|(e, _)| *e == ext) {
            log::debug!("loading {} via the .{ext} adapter", path.display());
            return adapter(path);
        }
        if UNSUPPORTED.contains(&ext.as_str()) {
            return Err(Error::UnsupportedFormat(ext));
        }
    }
    let adapter = sniff_adapter(path)?;
    adapter(path)
}

/// Pick an adapter from the file's leading bytes: ZIP containers are EPUBs,
/// NUL-free content is text, anything else is refused.
fn sniff_adapter(path: &Path) -> Result<AdapterFn> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)?;
    let mut prefix = [0u8; 4096];
    let n = file.read(&mut prefix)?;
    let prefix = &prefix[..n];

    if prefix.starts_with(b"PK\x03\x04") {
        return Ok(read_epub as AdapterFn);
    }
    if prefix.contains(&0) {
        return Err(Error::UnsupportedFormat(path.display().to_string()));
    }
    Ok(read_text as AdapterFn)
}

/// Fallback document title: the file stem.
pub(crate) fn stem_title(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}
