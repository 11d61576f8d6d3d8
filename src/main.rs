//! folio - Terminal document reader

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use folio::import::load_document;
use folio::progress::{ProgressRecord, ProgressStore, file_hash};
use folio::session::Session;
use folio::{Error, pager};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Terminal document reader", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio book.epub              Read, restoring saved progress
    folio notes.md --chapter 3   Start at chapter 3
    folio book.epub --percent 50 Start halfway through
    folio -i book.epub           Show document info")]
struct Cli {
    /// Input file (EPUB, Markdown, or plain text)
    #[arg(value_name = "FILE", required_unless_present = "clean")]
    file: Option<PathBuf>,

    /// Start at this page (1-based)
    #[arg(long, value_name = "N", conflicts_with_all = ["chapter", "percent"])]
    page: Option<usize>,

    /// Start at this chapter (1-based)
    #[arg(long, value_name = "N", conflicts_with = "percent")]
    chapter: Option<usize>,

    /// Start at this percentage of the document
    #[arg(long, value_name = "P")]
    percent: Option<f64>,

    /// Show document metadata without opening the pager
    #[arg(short, long)]
    info: bool,

    /// Ignore saved progress for this run
    #[arg(long)]
    fresh: bool,

    /// Delete all saved progress and exit
    #[arg(long)]
    clean: bool,

    /// Override terminal width
    #[arg(long, value_name = "COLS")]
    columns: Option<usize>,

    /// Override terminal height
    #[arg(long, value_name = "ROWS")]
    rows: Option<usize>,

    /// Progress file location
    #[arg(long, value_name = "PATH")]
    progress_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> folio::Result<()> {
    let store = match cli.progress_file {
        Some(path) => ProgressStore::new(path),
        None => ProgressStore::new(ProgressStore::default_path()),
    };

    if cli.clean {
        store.clear()?;
        println!("cleared saved progress");
        return Ok(());
    }

    let path = cli.file.expect("FILE required");
    let doc = load_document(&path)?;
    let geometry = pager::probe_geometry(cli.columns, cli.rows);
    let mut session = Session::new(doc, geometry)?;

    if cli.info {
        print_info(&path, &session);
        return Ok(());
    }

    let hash = file_hash(&path)?;

    // Explicit addressing beats saved progress; out-of-range requests here
    // are errors, unlike in-session navigation which clamps.
    if let Some(page) = cli.page {
        let page = page.checked_sub(1).ok_or(Error::PageOutOfRange {
            page: 0,
            count: session.total_pages(),
        })?;
        session.start_at_page(page)?;
    } else if let Some(chapter) = cli.chapter {
        let chapter = chapter.checked_sub(1).ok_or(Error::ChapterOutOfRange {
            chapter: 0,
            count: session.chapter_count(),
        })?;
        session.start_at_chapter(chapter)?;
    } else if let Some(percent) = cli.percent {
        session.start_at_percent(percent)?;
    } else if !cli.fresh
        && let Some(record) = store.load(&hash)
    {
        session.restore(record.page_index, record.total_pages);
    }

    let position = pager::run(&mut session)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    store.save(ProgressRecord::new(
        hash,
        file_name,
        position,
        session.total_pages(),
    ))?;

    Ok(())
}

fn print_info(path: &std::path::Path, session: &Session) {
    println!("File: {}", path.display());
    println!("Title: {}", session.title());
    if let Some(author) = session.author() {
        println!("Author: {author}");
    }
    println!("Chapters: {}", session.chapter_count());
    println!("Characters: {}", session.document().total_chars());
    println!("Pages: {}", session.total_pages());
    let geometry = session.geometry();
    println!("Geometry: {}x{}", geometry.columns, geometry.rows);
}
