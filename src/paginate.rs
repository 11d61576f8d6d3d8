//! The pagination engine: wraps chapter text into display lines and groups
//! them into fixed-height pages aligned to chapter boundaries.
//!
//! Pagination is deterministic: the same document and geometry always produce
//! the same pages. Persisted reading positions are page indices, so this is a
//! hard requirement, not an optimization.

use unicode_width::UnicodeWidthChar;

use crate::document::FlatDocument;
use crate::error::{Error, Result};

/// Display constraints pagination is computed against.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    /// Page width in terminal cells.
    pub columns: usize,
    /// Page height in display lines.
    pub rows: usize,
    /// Terminal column cost of one character (1 or 2 cells).
    pub char_width: fn(char) -> usize,
}

impl Geometry {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            char_width: default_char_width,
        }
    }
}

/// Width rule: fullwidth/CJK glyphs occupy two cells, everything else one.
pub fn default_char_width(c: char) -> usize {
    match c.width() {
        Some(2) => 2,
        _ => 1,
    }
}

/// One display page: at most `rows` lines, each at most `columns` cells wide,
/// all belonging to a single chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub chapter_index: usize,
    pub lines: Vec<String>,
}

/// The full pagination of a document under one geometry.
///
/// Produced once per run by [`paginate`] and immutable thereafter; a reading
/// session owns one `PageIndex` for its whole lifetime. Address conversions
/// (page/chapter/percent) live in [`crate::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIndex {
    pages: Vec<Page>,
    chapter_first_page: Vec<usize>,
}

impl PageIndex {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn chapter_count(&self) -> usize {
        self.chapter_first_page.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// First page of each chapter, indexed by chapter. Strictly increasing.
    pub fn chapter_first_pages(&self) -> &[usize] {
        &self.chapter_first_page
    }
}

/// Partition a document into pages.
///
/// Each source line wraps into one or more display lines; lines fill pages of
/// exactly `rows`, except that a chapter's final page may run short; a
/// chapter always starts on a fresh page, never sharing one with its
/// predecessor. A document that survived [`crate::normalize`] always yields
/// at least one page.
pub fn paginate(doc: &FlatDocument, geometry: &Geometry) -> Result<PageIndex> {
    if geometry.columns == 0 || geometry.rows == 0 {
        return Err(Error::InvalidGeometry {
            columns: geometry.columns,
            rows: geometry.rows,
        });
    }

    let mut pages: Vec<Page> = Vec::new();
    let mut chapter_first_page = Vec::with_capacity(doc.chapters.len());

    for chapter in &doc.chapters {
        chapter_first_page.push(pages.len());
        let mut lines: Vec<String> = Vec::with_capacity(geometry.rows);

        for source_line in chapter.body.lines() {
            for wrapped in wrap_line(source_line, geometry.columns, geometry.char_width) {
                lines.push(wrapped);
                if lines.len() == geometry.rows {
                    pages.push(Page {
                        index: pages.len(),
                        chapter_index: chapter.index,
                        lines: std::mem::take(&mut lines),
                    });
                }
            }
        }

        // Short final page for the chapter.
        if !lines.is_empty() {
            pages.push(Page {
                index: pages.len(),
                chapter_index: chapter.index,
                lines,
            });
        }
    }

    log::debug!(
        "paginated {} chapters into {} pages at {}x{}",
        doc.chapter_count(),
        pages.len(),
        geometry.columns,
        geometry.rows,
    );

    Ok(PageIndex {
        pages,
        chapter_first_page,
    })
}

/// Wrap a single source line into display lines no wider than `columns`.
///
/// Greedy word wrap: a word moves to the next line when it no longer fits; a
/// word wider than a full line is split at character granularity. The source
/// line's leading indentation survives on its first display line. Always
/// returns at least one line, so blank source lines stay visible.
fn wrap_line(text: &str, columns: usize, char_width: fn(char) -> usize) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![String::new()];
    }

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut width = 0;
    let mut has_word = false;

    let indent: String = text.chars().take_while(|c| c.is_whitespace()).collect();
    let indent_width: usize = indent.chars().map(char_width).sum();
    if indent_width > 0 && indent_width < columns {
        line.push_str(&indent);
        width = indent_width;
    }

    for word in text.split_whitespace() {
        let word_width: usize = word.chars().map(char_width).sum();
        let separator = if has_word { 1 } else { 0 };

        if width + separator + word_width <= columns {
            if separator == 1 {
                line.push(' ');
                width += 1;
            }
            line.push_str(word);
            width += word_width;
            has_word = true;
        } else if word_width <= columns {
            if has_word {
                lines.push(std::mem::take(&mut line));
            } else {
                // Indentation alone does not earn a line of its own.
                line.clear();
            }
            line.push_str(word);
            width = word_width;
            has_word = true;
        } else {
            // Word wider than a full line: hard split at character level.
            if has_word {
                lines.push(std::mem::take(&mut line));
            } else {
                line.clear();
            }
            width = 0;
            for c in word.chars() {
                let w = char_width(c);
                // A glyph wider than the whole page still gets a line; width
                // can only overflow when nothing else fits beside it.
                if width + w > columns && width > 0 {
                    lines.push(std::mem::take(&mut line));
                    width = 0;
                }
                line.push(c);
                width += w;
            }
            has_word = true;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
