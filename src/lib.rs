//! # folio
//!
//! A fast terminal reader for EPUB, Markdown, and plain-text documents.
//!
//! ## Features
//!
//! - Format adapters that normalize EPUB archives, Markdown, and plain text
//!   (with encoding detection) into ordered chapters
//! - Deterministic pagination under a terminal geometry, wide-character aware
//! - Addressing by page, chapter, or percentage, kept mutually consistent
//! - Reading progress that survives restarts and geometry changes
//!
//! ## Quick Start
//!
//! ```
//! use folio::{Geometry, RawChapter, normalize, paginate};
//!
//! let chapters = vec![
//!     RawChapter::new("One", "It was a dark and stormy night.\n"),
//!     RawChapter::new("Two", "The rain fell in torrents.\n"),
//! ];
//! let doc = normalize(chapters)?;
//! let index = paginate(&doc, &Geometry::new(40, 12))?;
//!
//! // Chapter 1 starts on its own page.
//! assert_eq!(index.page_for_chapter(1)?, 1);
//! assert_eq!(index.chapter_for_page(0)?, 0);
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Reading a file
//!
//! ```no_run
//! use folio::import::load_document;
//! use folio::{Geometry, Session};
//!
//! let doc = load_document("book.epub".as_ref())?;
//! let mut session = Session::new(doc, Geometry::new(80, 23))?;
//! session.start_at_percent(50.0)?;
//! # Ok::<(), folio::Error>(())
//! ```

pub mod document;
pub mod error;
pub mod import;
pub mod nav;
pub mod normalize;
pub mod paginate;
pub mod progress;
mod resolve;
pub mod session;
pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod pager;

pub use document::{Chapter, FlatDocument, LoadedDocument, RawChapter};
pub use error::{Error, Result};
pub use nav::{Command, NavState};
pub use normalize::normalize;
pub use paginate::{Geometry, Page, PageIndex, paginate};
pub use session::{Position, Session, rescale_page};
