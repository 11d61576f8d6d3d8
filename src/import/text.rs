//! Plain-text adapter: decodes the file and detects chapter markers.
//!
//! Novels shipped as a single .txt usually still carry chapter headings
//! ("Chapter 12", "第十二章"). A marker line starts a new chapter and becomes
//! its title; files without markers load as one chapter.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::stem_title;
use crate::document::{LoadedDocument, RawChapter};
use crate::error::Result;
use crate::util::{decode_text, normalize_newlines};

/// A heading line is short and matches one of the marker shapes; anything
/// longer is prose that happens to start with "Chapter".
const MAX_MARKER_LEN: usize = 80;

fn chapter_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(
            r"(?xi)
            ^(?:
                (?:chapter|section|part) \s+ (?:\d{1,4}|[ivxlcdm]{1,8}) (?:[\s:.\-].*)?
              | 第 \s* (?:\d{1,4}|[一二三四五六七八九十百千万]{1,8}) \s* [章节回话] .*
            )$",
        )
        .expect("chapter marker pattern")
    })
}

pub fn read_text(path: &Path) -> Result<LoadedDocument> {
    let bytes = std::fs::read(path)?;
    let text = normalize_newlines(&decode_text(&bytes, None));
    let title = stem_title(path);
    let chapters = split_marker_chapters(&text, &title);
    Ok(LoadedDocument {
        title,
        author: None,
        chapters,
    })
}

fn split_marker_chapters(text: &str, fallback_title: &str) -> Vec<RawChapter> {
    let marker = chapter_marker();
    let mut chapters = Vec::new();
    let mut title: Option<String> = None;
    let mut body = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.len() <= MAX_MARKER_LEN && marker.is_match(trimmed) {
            if title.is_some() || !body.trim().is_empty() {
                chapters.push(RawChapter::new(
                    title.take().unwrap_or_else(|| fallback_title.to_string()),
                    std::mem::take(&mut body),
                ));
            }
            body.clear();
            title = Some(trimmed.to_string());
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

    if chapters.is_empty() {
        // Whole file was blank; hand the normalizer a single chapter and let
        // it report the empty document.
        chapters.push(RawChapter::new(fallback_title, text));
    }

    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers_single_chapter() {
        let chapters = split_marker_chapters("some prose\nmore prose\n", "novel");
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "novel");
        assert_eq!(chapters[0].body, "some prose\nmore prose\n");
    }

    #[test]
    fn test_english_chapter_markers() {
        let text = "Chapter 1\nfirst\n\nCHAPTER 2: The Return\nsecond\n";
        let chapters = split_marker_chapters(text, "novel");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Chapter 1");
        assert_eq!(chapters[1].title, "CHAPTER 2: The Return");
        assert_eq!(chapters[1].body.trim(), "second");
    }

    #[test]
    fn test_roman_numeral_markers() {
        let text = "Part IV\nbody\n";
        let chapters = split_marker_chapters(text, "novel");
        assert_eq!(chapters[0].title, "Part IV");
    }

    #[test]
    fn test_cjk_chapter_markers() {
        let text = "第一章 初遇\n正文内容\n第2章\n更多内容\n";
        let chapters = split_marker_chapters(text, "novel");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "第一章 初遇");
        assert_eq!(chapters[1].title, "第2章");
    }

    #[test]
    fn test_preamble_before_first_marker() {
        let text = "by the author\n\nChapter 1\nbody\n";
        let chapters = split_marker_chapters(text, "novel");
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "novel");
        assert_eq!(chapters[1].title, "Chapter 1");
    }

    #[test]
    fn test_prose_mentioning_chapter_not_split() {
        let text = "Chapter 1\nIn chapter 3 of that book he had read something\n";
        let chapters = split_marker_chapters(text, "novel");
        // The second line starts with "In", so it stays in the body.
        assert_eq!(chapters.len(), 1);
        assert!(chapters[0].body.contains("chapter 3"));
    }
}
