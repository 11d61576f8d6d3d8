//! Text normalization: adapter output to a flattened document.
//!
//! Cleanup here is format-agnostic; adapters have already removed their
//! format's markup. Trailing whitespace is trimmed per line, runs of three or
//! more blank lines collapse to a single blank line, and chapters left empty
//! by cleanup are merged into the chapter that follows them so an empty
//! chapter never becomes its own page-bearing unit.

use crate::document::{Chapter, FlatDocument, RawChapter};
use crate::error::{Error, Result};

/// Flatten adapter output into ordered, cleaned chapters with cumulative
/// character offsets.
///
/// Fails with [`Error::EmptyDocument`] when no chapter has content left after
/// cleanup.
pub fn normalize(raw: Vec<RawChapter>) -> Result<FlatDocument> {
    let mut chapters: Vec<Chapter> = Vec::with_capacity(raw.len());
    // Title of a preceding empty chapter, waiting to be merged forward. A
    // heading-only chapter is almost always a part title for the chapter
    // that follows it.
    let mut pending_title: Option<String> = None;

    for chapter in raw {
        let body = clean_body(&chapter.body);
        if body.is_empty() {
            if pending_title.is_none() && !chapter.title.trim().is_empty() {
                pending_title = Some(chapter.title);
            }
            continue;
        }

        let title = if chapter.title.trim().is_empty() {
            pending_title.take().unwrap_or(chapter.title)
        } else {
            pending_title = None;
            chapter.title
        };

        chapters.push(Chapter {
            index: chapters.len(),
            title,
            body,
        });
    }

    if chapters.is_empty() {
        return Err(Error::EmptyDocument);
    }

    let mut chapter_start_offsets = Vec::with_capacity(chapters.len());
    let mut offset = 0;
    for chapter in &chapters {
        chapter_start_offsets.push(offset);
        offset += chapter.body.chars().count();
    }

    Ok(FlatDocument {
        chapters,
        chapter_start_offsets,
    })
}

/// Trim trailing whitespace per line, collapse runs of >= 3 blank lines to a
/// single blank line, and drop leading/trailing blank lines entirely.
fn clean_body(body: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blanks = 0;

    for line in body.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blanks += 1;
        } else {
            if !lines.is_empty() {
                let keep = if blanks >= 3 { 1 } else { blanks };
                for _ in 0..keep {
                    lines.push("");
                }
            }
            blanks = 0;
            lines.push(line);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_trailing_whitespace() {
        let doc = normalize(vec![RawChapter::new("One", "hello   \nworld\t\n")]).unwrap();
        assert_eq!(doc.chapters[0].body, "hello\nworld");
    }

    #[test]
    fn test_collapses_long_blank_runs() {
        let doc = normalize(vec![RawChapter::new("One", "a\n\n\n\n\nb")]).unwrap();
        assert_eq!(doc.chapters[0].body, "a\n\nb");
    }

    #[test]
    fn test_keeps_short_blank_runs() {
        let doc = normalize(vec![RawChapter::new("One", "a\n\n\nb")]).unwrap();
        // Two blank lines stay as they are; only runs of three or more collapse.
        assert_eq!(doc.chapters[0].body, "a\n\n\nb");
    }

    #[test]
    fn test_strips_surrounding_blank_lines() {
        let doc = normalize(vec![RawChapter::new("One", "\n\n  \nbody\n\n\n")]).unwrap();
        assert_eq!(doc.chapters[0].body, "body");
    }

    #[test]
    fn test_empty_chapter_merges_forward() {
        let doc = normalize(vec![
            RawChapter::new("Part I", "   \n\n"),
            RawChapter::new("", "content"),
            RawChapter::new("Two", "more"),
        ])
        .unwrap();
        assert_eq!(doc.chapter_count(), 2);
        assert_eq!(doc.chapters[0].title, "Part I");
        assert_eq!(doc.chapters[0].body, "content");
        assert_eq!(doc.chapters[1].title, "Two");
        assert_eq!(doc.chapters[1].index, 1);
    }

    #[test]
    fn test_titled_follower_keeps_own_title() {
        let doc = normalize(vec![
            RawChapter::new("Part I", ""),
            RawChapter::new("Chapter One", "content"),
        ])
        .unwrap();
        assert_eq!(doc.chapters[0].title, "Chapter One");
    }

    #[test]
    fn test_trailing_empty_chapter_dropped() {
        let doc = normalize(vec![
            RawChapter::new("One", "content"),
            RawChapter::new("Colophon", "\n\n"),
        ])
        .unwrap();
        assert_eq!(doc.chapter_count(), 1);
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = normalize(vec![RawChapter::new("One", "  \n\n")]).unwrap_err();
        assert!(matches!(err, Error::EmptyDocument));
    }

    #[test]
    fn test_chapter_start_offsets() {
        let doc = normalize(vec![
            RawChapter::new("One", "abc"),
            RawChapter::new("Two", "你好"),
            RawChapter::new("Three", "xy"),
        ])
        .unwrap();
        // Offsets count characters, not bytes.
        assert_eq!(doc.chapter_start_offsets, vec![0, 3, 5]);
        assert_eq!(doc.total_chars(), 7);
    }
}
