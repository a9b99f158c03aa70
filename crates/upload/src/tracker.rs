//! Results table for the commit pass.
//!
//! The tracker streams one HTML table row per CSV line as the commit pass
//! advances. Messages for the current line are collected per column and
//! severity, then written out when the next line begins (`flush`) or when
//! the table ends (`close`):
//!
//! ```text
//!   start ──► Empty ──track──► Accumulating ──flush──► Empty ──close──► Closed
//!                 ▲                 │
//!                 └─────flush───────┘ (no `line` message: nothing written)
//! ```
//!
//! Message text is written as markup. Escape user data before tracking it.

use std::io::Write;

use crate::error::UploadError;
use crate::strings;

/// Fixed results table columns, in display order.
pub const COLUMNS: [&str; 5] = ["line", "comment", "context", "instance", "status"];

/// Message severity. Rendered in declaration order within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Normal,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Severity::Normal, Severity::Info, Severity::Warning, Severity::Error];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Messages of the pending line: column × severity.
#[derive(Debug, Default)]
struct RowState {
    cells: [[String; 4]; 5],
}

impl RowState {
    fn has_line_number(&self) -> bool {
        !self.cells[0][Severity::Normal.index()].is_empty()
    }
}

#[derive(Debug)]
enum State {
    Empty,
    Accumulating(RowState),
    Closed,
}

pub struct ProgressTracker<W: Write> {
    out: W,
    state: State,
}

impl<W: Write> ProgressTracker<W> {
    pub fn new(out: W) -> Self {
        Self { out, state: State::Empty }
    }

    /// Write the table opening and header row.
    pub fn start(&mut self) -> Result<(), UploadError> {
        if matches!(self.state, State::Closed) {
            return Err(UploadError::TrackerClosed);
        }

        write!(
            self.out,
            "<table id=\"ucresults\" class=\"generaltable boxaligncenter flexible-wrap\" summary=\"{}\">",
            strings::UPLOAD_RESULTS
        )?;
        write!(self.out, "<tr class=\"heading r0\">")?;
        let headings = [strings::CSV_LINE, strings::COMMENT, strings::CONTEXT, strings::INSTANCE, strings::STATUS];
        for (ci, heading) in headings.iter().enumerate() {
            write!(self.out, "<th class=\"header c{ci}\" scope=\"col\">{heading}</th>")?;
        }
        writeln!(self.out, "</tr>")?;

        self.state = State::Empty;
        Ok(())
    }

    /// Write the pending line, if it has a line number, and start a new one.
    pub fn flush(&mut self) -> Result<(), UploadError> {
        match std::mem::replace(&mut self.state, State::Empty) {
            State::Closed => {
                self.state = State::Closed;
                Err(UploadError::TrackerClosed)
            }
            State::Accumulating(row) if row.has_line_number() => self.write_row(&row),
            // Nothing to print - each line has to have at least a number
            State::Accumulating(_) | State::Empty => Ok(()),
        }
    }

    /// Add a normal message to `column`, appending to earlier ones.
    pub fn track(&mut self, column: &str, msg: &str) -> Result<(), UploadError> {
        self.track_as(column, msg, Severity::Normal, true)
    }

    /// Add a message to `column` at `severity`. With `merge`, the message is
    /// appended on a new line; otherwise it replaces earlier text of the same
    /// severity. Unknown columns are logged and ignored.
    pub fn track_as(&mut self, column: &str, msg: &str, severity: Severity, merge: bool) -> Result<(), UploadError> {
        if matches!(self.state, State::Closed) {
            return Err(UploadError::TrackerClosed);
        }

        let Some(ci) = COLUMNS.iter().position(|c| *c == column) else {
            log::warn!("Incorrect column: {column}");
            return Ok(());
        };

        if matches!(self.state, State::Empty) {
            self.state = State::Accumulating(RowState::default());
        }
        if let State::Accumulating(row) = &mut self.state {
            let cell = &mut row.cells[ci][severity.index()];
            if merge {
                if !cell.is_empty() {
                    cell.push_str("<br />");
                }
                cell.push_str(msg);
            } else {
                *cell = msg.to_string();
            }
        }
        Ok(())
    }

    /// Write the pending line and end the table. No further calls are accepted.
    pub fn close(&mut self) -> Result<(), UploadError> {
        self.flush()?;
        writeln!(self.out, "</table>")?;
        self.state = State::Closed;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_row(&mut self, row: &RowState) -> Result<(), UploadError> {
        write!(self.out, "<tr class=\"r1\">")?;
        for (ci, cell) in row.cells.iter().enumerate() {
            let spans: Vec<String> = Severity::ALL
                .iter()
                .filter(|severity| !cell[severity.index()].is_empty())
                .map(|severity| {
                    format!("<span class=\"uc{}\">{}</span>", severity.name(), cell[severity.index()])
                })
                .collect();

            write!(self.out, "<td class=\"cell c{ci}\">")?;
            if spans.is_empty() {
                write!(self.out, "&nbsp;")?;
            } else {
                write!(self.out, "{}", spans.join("<br />"))?;
            }
            write!(self.out, "</td>")?;
        }
        writeln!(self.out, "</tr>")?;
        Ok(())
    }
}
