//! Markdown adapter: decodes the file and splits chapters on level-1 ATX
//! headings.

use std::path::Path;

use super::stem_title;
use crate::document::{LoadedDocument, RawChapter};
use crate::error::Result;
use crate::util::{decode_text, normalize_newlines};

pub fn read_markdown(path: &Path) -> Result<LoadedDocument> {
    let bytes = std::fs::read(path)?;
    let text = normalize_newlines(&decode_text(&bytes, None));
    let title = stem_title(path);
    let chapters = split_heading_chapters(&text, &title);
    Ok(LoadedDocument {
        title,
        author: None,
        chapters,
    })
}

/// Split on `# ` headings. Content before the first heading becomes a chapter
/// named after the file; a document without headings is one chapter.
fn split_heading_chapters(text: &str, fallback_title: &str) -> Vec<RawChapter> {
    let mut chapters = Vec::new();
    let mut title: Option<String> = None;
    let mut body = String::new();

    for line in text.lines() {
        if let Some(heading) = line.strip_prefix("# ") {
            // The preamble only counts when it has content.
            if title.is_some() || !body.trim().is_empty() {
                chapters.push(RawChapter::new(
                    title.take().unwrap_or_else(|| fallback_title.to_string()),
                    std::mem::take(&mut body),
                ));
            }
            body.clear();
            title = Some(heading_label(heading));
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }

    if title.is_some() || !body.trim().is_empty() {
        chapters.push(RawChapter::new(
            title.unwrap_or_else(|| fallback_title.to_string()),
            body,
        ));
    }

    chapters
}

/// Heading text without optional closing hashes: `# Title ##` -> `Title`.
fn heading_label(heading: &str) -> String {
    heading.trim().trim_end_matches('#').trim_end().to_string()
}
