//! Navigation state machine for an interactive reading session.
//!
//! Every command is a total, synchronous transition: out-of-range requests
//! clamp silently at the document's ends instead of failing. The reader never
//! sees a navigation error for over-paging.

use crate::paginate::PageIndex;

/// A navigation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextPage,
    PrevPage,
    /// Advance one display line, crossing into the next page from the last
    /// line of the current one.
    NextLine,
    PrevLine,
    NextChapter,
    PrevChapter,
    JumpStart,
    JumpEnd,
    /// Terminal transition: leaves the position untouched; the session loop
    /// emits the final position for persistence.
    Quit,
}

/// Cursor into a paginated document: the current page plus the display line
/// within it reached by line-level scrolling.
///
/// Invariant: `page` is always a valid index into the [`PageIndex`] and
/// `line` a valid index into that page's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    page: usize,
    line: usize,
}

impl NavState {
    /// Start at `page`, clamped into the document's range.
    pub fn new(page: usize, index: &PageIndex) -> Self {
        Self {
            page: page.min(index.total_pages().saturating_sub(1)),
            line: 0,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Line within the current page reached by line scrolling.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Apply a command. Returns true when the position changed, so callers
    /// can skip redraws and surface "already at the end" feedback.
    pub fn apply(&mut self, command: Command, index: &PageIndex) -> bool {
        let before = *self;
        let last = index.total_pages().saturating_sub(1);

        match command {
            Command::NextPage => {
                self.page = (self.page + 1).min(last);
                self.line = 0;
            }
            Command::PrevPage => {
                self.page = self.page.saturating_sub(1);
                self.line = 0;
            }
            Command::NextLine => {
                let lines = self.page_lines(index);
                if self.line + 1 < lines {
                    self.line += 1;
                } else if self.page < last {
                    self.page += 1;
                    self.line = 0;
                }
            }
            Command::PrevLine => {
                if self.line > 0 {
                    self.line -= 1;
                } else if self.page > 0 {
                    self.page -= 1;
                    self.line = self.page_lines(index).saturating_sub(1);
                }
            }
            Command::NextChapter => {
                if let Some(page) = index.page(self.page) {
                    let next = page.chapter_index + 1;
                    if let Some(&first) = index.chapter_first_pages().get(next) {
                        self.page = first;
                        self.line = 0;
                    }
                }
            }
            Command::PrevChapter => {
                if let Some(page) = index.page(self.page)
                    && let Some(prev) = page.chapter_index.checked_sub(1)
                    && let Some(&first) = index.chapter_first_pages().get(prev)
                {
                    self.page = first;
                    self.line = 0;
                }
            }
            Command::JumpStart => {
                self.page = 0;
                self.line = 0;
            }
            Command::JumpEnd => {
                self.page = last;
                self.line = 0;
            }
            Command::Quit => {}
        }

        *self != before
    }

    fn page_lines(&self, index: &PageIndex) -> usize {
        index.page(self.page).map(|p| p.lines.len()).unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawChapter;
    use crate::normalize::normalize;
    use crate::paginate::{Geometry, paginate};

    fn index() -> crate::paginate::PageIndex {
        // Two chapters, rows=2: chapter 0 has pages [a,b] [c]; chapter 1 has
        // [d,e] [f].
        let doc = normalize(vec![
            RawChapter::new("One", "a\nb\nc"),
            RawChapter::new("Two", "d\ne\nf"),
        ])
        .unwrap();
        paginate(&doc, &Geometry::new(10, 2)).unwrap()
    }

    #[test]
    fn test_page_navigation_clamps() {
        let index = index();
        let mut nav = NavState::new(0, &index);
        assert!(!nav.apply(Command::PrevPage, &index));
        assert!(nav.apply(Command::NextPage, &index));
        assert_eq!(nav.page(), 1);

        nav.apply(Command::JumpEnd, &index);
        assert_eq!(nav.page(), 3);
        assert!(!nav.apply(Command::NextPage, &index));
        assert_eq!(nav.page(), 3);
    }

    #[test]
    fn test_line_crosses_page_boundary() {
        let index = index();
        let mut nav = NavState::new(0, &index);
        assert!(nav.apply(Command::NextLine, &index));
        assert_eq!((nav.page(), nav.line()), (0, 1));
        // Last line of page 0 -> first line of page 1.
        assert!(nav.apply(Command::NextLine, &index));
        assert_eq!((nav.page(), nav.line()), (1, 0));
        // And back.
        assert!(nav.apply(Command::PrevLine, &index));
        assert_eq!((nav.page(), nav.line()), (0, 1));
    }

    #[test]
    fn test_line_clamps_at_document_ends() {
        let index = index();
        let mut nav = NavState::new(0, &index);
        assert!(!nav.apply(Command::PrevLine, &index));

        nav.apply(Command::JumpEnd, &index);
        // Page 3 holds the single line "f".
        assert!(!nav.apply(Command::NextLine, &index));
        assert_eq!((nav.page(), nav.line()), (3, 0));
    }

    #[test]
    fn test_chapter_navigation() {
        let index = index();
        let mut nav = NavState::new(0, &index);
        assert!(nav.apply(Command::NextChapter, &index));
        assert_eq!(nav.page(), 2);
        assert!(!nav.apply(Command::NextChapter, &index));

        assert!(nav.apply(Command::PrevChapter, &index));
        assert_eq!(nav.page(), 0);
        assert!(!nav.apply(Command::PrevChapter, &index));
    }

    #[test]
    fn test_restored_page_clamped() {
        let index = index();
        let nav = NavState::new(500, &index);
        assert_eq!(nav.page(), 3);
    }

    #[test]
    fn test_quit_is_a_no_op() {
        let index = index();
        let mut nav = NavState::new(2, &index);
        assert!(!nav.apply(Command::Quit, &index));
        assert_eq!(nav.page(), 2);
    }
}
