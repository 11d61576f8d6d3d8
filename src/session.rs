//! A reading session: one document paginated under one geometry, with a
//! navigation cursor and progress restoration.
//!
//! The session holds no process-wide state: the restored position and the
//! geometry come in from the caller, and the final position goes back out for
//! the progress store to persist.

use crate::document::{FlatDocument, LoadedDocument};
use crate::error::{Error, Result};
use crate::nav::{Command, NavState};
use crate::normalize::normalize;
use crate::paginate::{Geometry, Page, PageIndex, paginate};

/// A reading position expressed in all three addressing schemes, as reported
/// for display and persisted at session end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub page: usize,
    pub chapter: usize,
    pub percent: f64,
}

/// One document, paginated once, navigated until quit.
#[derive(Debug)]
pub struct Session {
    title: String,
    author: Option<String>,
    doc: FlatDocument,
    geometry: Geometry,
    index: PageIndex,
    nav: NavState,
}

impl Session {
    /// Normalize and paginate a loaded document, positioned at page zero.
    pub fn new(loaded: LoadedDocument, geometry: Geometry) -> Result<Self> {
        let doc = normalize(loaded.chapters)?;
        let index = paginate(&doc, &geometry)?;
        log::info!(
            "opened \"{}\": {} chapters, {} pages",
            loaded.title,
            doc.chapter_count(),
            index.total_pages(),
        );
        let nav = NavState::new(0, &index);
        Ok(Self {
            title: loaded.title,
            author: loaded.author,
            doc,
            geometry,
            index,
            nav,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn document(&self) -> &FlatDocument {
        &self.doc
    }

    pub fn page_index(&self) -> &PageIndex {
        &self.index
    }

    pub fn total_pages(&self) -> usize {
        self.index.total_pages()
    }

    pub fn chapter_count(&self) -> usize {
        self.doc.chapter_count()
    }

    /// Title of the chapter the cursor is in.
    pub fn chapter_title(&self) -> &str {
        self.current_page()
            .and_then(|p| self.doc.chapters.get(p.chapter_index))
            .map(|c| c.title.as_str())
            .unwrap_or("")
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.index.page(self.nav.page())
    }

    /// Up to `count` display lines starting at the cursor, continuing into
    /// following pages when the cursor is line-scrolled mid-page.
    pub fn view_lines(&self, count: usize) -> Vec<&str> {
        let mut lines = Vec::with_capacity(count);
        let mut page = self.nav.page();
        let mut skip = self.nav.line();
        while lines.len() < count {
            let Some(p) = self.index.page(page) else {
                break;
            };
            for line in p.lines.iter().skip(skip) {
                lines.push(line.as_str());
                if lines.len() == count {
                    break;
                }
            }
            skip = 0;
            page += 1;
        }
        lines
    }

    /// Restore a previously persisted position.
    ///
    /// When the stored total page count differs from the current pagination
    /// (re-wrap under a different geometry, or an edited document), the page
    /// is rescaled to the same relative position rather than used verbatim;
    /// a reader 25% in stays 25% in.
    pub fn restore(&mut self, page: usize, total_pages_at_last_read: usize) {
        let page = rescale_page(page, total_pages_at_last_read, self.index.total_pages());
        self.nav = NavState::new(page, &self.index);
    }

    /// Start at an explicit page. Unlike in-session navigation this rejects
    /// out-of-range requests instead of clamping them.
    pub fn start_at_page(&mut self, page: usize) -> Result<()> {
        if page >= self.index.total_pages() {
            return Err(Error::PageOutOfRange {
                page,
                count: self.index.total_pages(),
            });
        }
        self.nav = NavState::new(page, &self.index);
        Ok(())
    }

    /// Start at the first page of a chapter.
    pub fn start_at_chapter(&mut self, chapter: usize) -> Result<()> {
        let page = self.index.page_for_chapter(chapter)?;
        self.nav = NavState::new(page, &self.index);
        Ok(())
    }

    /// Start at a percentage of the document.
    pub fn start_at_percent(&mut self, percent: f64) -> Result<()> {
        let page = self.index.page_for_percent(percent)?;
        self.nav = NavState::new(page, &self.index);
        Ok(())
    }

    /// Apply a navigation command. Returns true when the position changed.
    pub fn apply(&mut self, command: Command) -> bool {
        self.nav.apply(command, &self.index)
    }

    /// The cursor in all three addressing schemes.
    pub fn position(&self) -> Position {
        let page = self.nav.page();
        Position {
            page,
            chapter: self
                .index
                .page(page)
                .map(|p| p.chapter_index)
                .unwrap_or(0),
            percent: self.index.percent_for_page(page),
        }
    }

    /// Re-paginate after a terminal size change, preserving the relative
    /// position by percentage. A full recomputation every time; pagination is
    /// never patched incrementally.
    pub fn resize(&mut self, geometry: Geometry) -> Result<()> {
        let percent = self.index.percent_for_page(self.nav.page());
        let index = paginate(&self.doc, &geometry)?;
        let page = index.page_for_percent(percent)?;
        log::debug!(
            "re-paginated at {}x{}: {} pages, cursor at page {}",
            geometry.columns,
            geometry.rows,
            index.total_pages(),
            page,
        );
        self.geometry = geometry;
        self.index = index;
        self.nav = NavState::new(page, &self.index);
        Ok(())
    }
}

/// Map a page index persisted under one total page count onto another,
/// preserving the relative position. Equal totals clamp only.
pub fn rescale_page(page: usize, old_total: usize, new_total: usize) -> usize {
    if new_total == 0 {
        return 0;
    }
    if old_total == new_total {
        return page.min(new_total - 1);
    }
    let percent = page as f64 / old_total.saturating_sub(1).max(1) as f64 * 100.0;
    let rescaled = (percent / 100.0 * new_total as f64).floor() as usize;
    rescaled.min(new_total - 1)
}
