//! Document model shared by format adapters and the pagination engine.
//!
//! Adapters produce [`LoadedDocument`]s; [`crate::normalize`] turns them into
//! the [`FlatDocument`] that pagination and addressing operate on.

/// A chapter as produced by a format adapter: title plus raw body text.
///
/// Bodies may still carry extraction artifacts (stray blank runs, trailing
/// whitespace); the normalizer cleans those up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChapter {
    pub title: String,
    pub body: String,
}

impl RawChapter {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A document as loaded by an adapter, before normalization.
#[derive(Debug, Clone, Default)]
pub struct LoadedDocument {
    pub title: String,
    pub author: Option<String>,
    pub chapters: Vec<RawChapter>,
}

/// A normalized chapter. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    /// Position of this chapter in reading order.
    pub index: usize,
    pub title: String,
    /// Cleaned body text: trailing whitespace trimmed per line, blank-line
    /// runs collapsed, never empty.
    pub body: String,
}

/// The flattened document: ordered chapters plus the character offset at
/// which each chapter's body begins in the concatenation of all bodies.
///
/// `chapter_start_offsets` is monotonically non-decreasing and has one entry
/// per chapter, with `chapter_start_offsets[0] == 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatDocument {
    pub chapters: Vec<Chapter>,
    pub chapter_start_offsets: Vec<usize>,
}

impl FlatDocument {
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    /// Total character count across all chapter bodies.
    pub fn total_chars(&self) -> usize {
        match (self.chapter_start_offsets.last(), self.chapters.last()) {
            (Some(offset), Some(chapter)) => offset + chapter.body.chars().count(),
            _ => 0,
        }
    }
}
