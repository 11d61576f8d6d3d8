//! Address resolution: conversions between the three addressing schemes
//! (page index, chapter index, percentage), all backed by the precomputed
//! [`PageIndex`].
//!
//! These run on every keystroke of an interactive session, so all of them are
//! O(1) lookups, never scans over the page list.

use crate::error::{Error, Result};
use crate::paginate::PageIndex;

impl PageIndex {
    /// First page of a chapter.
    pub fn page_for_chapter(&self, chapter: usize) -> Result<usize> {
        self.chapter_first_pages()
            .get(chapter)
            .copied()
            .ok_or(Error::ChapterOutOfRange {
                chapter,
                count: self.chapter_count(),
            })
    }

    /// Page at `percent` of the document: 0 lands on the first page, 100 on
    /// the last.
    pub fn page_for_percent(&self, percent: f64) -> Result<usize> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(Error::InvalidPercent(percent));
        }
        let total = self.total_pages();
        let page = (percent / 100.0 * total as f64).floor() as usize;
        Ok(page.min(total.saturating_sub(1)))
    }

    /// Percentage position of a page: 0 at the first page, 100 at the last.
    ///
    /// On a single-page document the denominator clamps to 1, so the first
    /// (and only) page reports 0.
    pub fn percent_for_page(&self, page: usize) -> f64 {
        let span = self.total_pages().saturating_sub(1).max(1);
        page as f64 / span as f64 * 100.0
    }

    /// Chapter that owns `page`.
    pub fn chapter_for_page(&self, page: usize) -> Result<usize> {
        self.page(page)
            .map(|p| p.chapter_index)
            .ok_or(Error::PageOutOfRange {
                page,
                count: self.total_pages(),
            })
    }
}
