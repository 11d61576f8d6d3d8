//! Interactive terminal pager: renders the current page and maps keys to
//! navigation commands.
//!
//! Uses the alternate screen and raw mode, restoring the caller's terminal on
//! the way out. When stdout is not a terminal the whole document is written
//! straight through instead, so `folio book.epub | grep ...` works.

use std::io::{self, IsTerminal, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};

use crate::error::Result;
use crate::nav::Command;
use crate::paginate::{Geometry, default_char_width};
use crate::session::{Position, Session};

/// Narrower than this and wrapping degenerates; probed terminals are clamped
/// up, explicit --columns overrides are taken at face value.
const MIN_COLUMNS: usize = 20;

/// Page geometry for this run: probed from the terminal unless overridden,
/// with one row reserved for the status bar.
pub fn probe_geometry(columns: Option<usize>, rows: Option<usize>) -> Geometry {
    let (term_cols, term_rows) = terminal::size()
        .map(|(c, r)| (c as usize, r as usize))
        .unwrap_or((80, 24));
    let columns = columns.unwrap_or_else(|| term_cols.max(MIN_COLUMNS));
    let rows = rows.unwrap_or_else(|| term_rows.saturating_sub(1).max(1));
    Geometry::new(columns, rows)
}

/// Run the interactive loop until the reader quits. Returns the final
/// position for persistence.
pub fn run(session: &mut Session) -> Result<Position> {
    let mut stdout = io::stdout();
    if !stdout.is_terminal() {
        dump_all(session, &mut stdout)?;
        return Ok(session.position());
    }

    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let result = event_loop(session, &mut stdout);
    // Restore the terminal even when the loop failed.
    let _ = execute!(stdout, LeaveAlternateScreen, Show);
    let _ = disable_raw_mode();
    result
}

fn event_loop(session: &mut Session, out: &mut impl Write) -> Result<Position> {
    draw(session, out)?;

    loop {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if is_interrupt(&key) {
                    break;
                }
                match command_for(&key) {
                    Some(Command::Quit) => break,
                    Some(command) => {
                        if session.apply(command) {
                            draw(session, out)?;
                        }
                    }
                    None => {}
                }
            }
            Event::Resize(columns, rows) => {
                let geometry = Geometry::new(
                    (columns as usize).max(MIN_COLUMNS),
                    (rows as usize).saturating_sub(1).max(1),
                );
                session.resize(geometry)?;
                draw(session, out)?;
            }
            _ => {}
        }
    }

    Ok(session.position())
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn command_for(key: &KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char(' ') | KeyCode::Char('f') | KeyCode::PageDown => Some(Command::NextPage),
        KeyCode::Char('b') | KeyCode::PageUp => Some(Command::PrevPage),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Enter => Some(Command::NextLine),
        KeyCode::Char('k') | KeyCode::Up => Some(Command::PrevLine),
        KeyCode::Char('l') | KeyCode::Right => Some(Command::NextChapter),
        KeyCode::Char('h') | KeyCode::Left => Some(Command::PrevChapter),
        KeyCode::Char('g') | KeyCode::Home => Some(Command::JumpStart),
        KeyCode::Char('G') | KeyCode::End => Some(Command::JumpEnd),
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        _ => None,
    }
}

fn draw(session: &Session, out: &mut impl Write) -> Result<()> {
    let geometry = *session.geometry();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    for (row, line) in session.view_lines(geometry.rows).iter().enumerate() {
        queue!(out, MoveTo(0, row as u16), Print(line))?;
    }

    let status = truncate_to_width(&status_line(session), geometry.columns);
    queue!(
        out,
        MoveTo(0, geometry.rows as u16),
        SetAttribute(Attribute::Reverse),
        Print(status),
        SetAttribute(Attribute::Reset),
    )?;
    out.flush()?;
    Ok(())
}

fn status_line(session: &Session) -> String {
    let position = session.position();
    format!(
        " {} · {} | {}/{} · {:.0}% | space/b page · j/k line · h/l chapter · g/G ends · q quit ",
        session.title(),
        session.chapter_title(),
        position.page + 1,
        session.total_pages(),
        position.percent,
    )
}

/// Clip a string to a display width, cell-aware.
fn truncate_to_width(text: &str, columns: usize) -> String {
    let mut width = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = default_char_width(c);
        if width + w > columns {
            break;
        }
        out.push(c);
        width += w;
    }
    out
}

/// Non-terminal output: write the whole paginated document through.
fn dump_all(session: &Session, out: &mut impl Write) -> Result<()> {
    for page in session.page_index().pages() {
        for line in &page.lines {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}
