// Preview pass: a bounded sample of rows with context resolved

use std::io::{self, Write};

use serde::Serialize;

use commentbank_core::fields::{self, COMMENT, CONTEXT_ID, CONTEXT_LEVEL};
use commentbank_io::{ImportSource, RecordStore};

use crate::error::UploadError;
use crate::html::escape;
use crate::resolver::resolve;
use crate::strings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewRow {
    /// One CSV line. `cells` line up with the preview columns.
    Data {
        line: usize,
        cells: Vec<String>,
        status: Vec<String>,
    },
    /// Marks that the file continues past the sample
    Elided { width: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<PreviewRow>,
}

impl Preview {
    /// Table headings: line number, one per column, status.
    pub fn headings(&self) -> Vec<String> {
        let mut head = Vec::with_capacity(self.columns.len() + 2);
        head.push(strings::CSV_LINE.to_string());
        head.extend(self.columns.iter().map(|c| fields::display_label(c).to_string()));
        head.push(strings::STATUS.to_string());
        head
    }

    /// Sampled data rows, without the elision marker.
    pub fn data_rows(&self) -> impl Iterator<Item = (&usize, &Vec<String>, &Vec<String>)> {
        self.rows.iter().filter_map(|row| match row {
            PreviewRow::Data { line, cells, status } => Some((line, cells, status)),
            PreviewRow::Elided { .. } => None,
        })
    }

    /// Number of sampled rows with at least one status message.
    pub fn problem_count(&self) -> usize {
        self.data_rows().filter(|(_, _, status)| !status.is_empty()).count()
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.rows.last(), Some(PreviewRow::Elided { .. }))
    }

    pub fn render_html<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "<div class=\"flexible-wrap\"><table id=\"ucpreview\" class=\"generaltable\" summary=\"{}\">",
            strings::UPLOAD_PREVIEW
        )?;
        write!(out, "<thead><tr>")?;
        for heading in self.headings() {
            write!(out, "<th scope=\"col\">{}</th>", escape(&heading))?;
        }
        writeln!(out, "</tr></thead><tbody>")?;

        for row in &self.rows {
            write!(out, "<tr>")?;
            match row {
                PreviewRow::Data { line, cells, status } => {
                    write!(out, "<td>{line}</td>")?;
                    for cell in cells {
                        write!(out, "<td>{}</td>", escape(cell))?;
                    }
                    let status: Vec<String> = status.iter().map(|s| escape(s)).collect();
                    write!(out, "<td>{}</td>", status.join("<br />"))?;
                }
                PreviewRow::Elided { width } => {
                    for _ in 0..*width {
                        write!(out, "<td>{}</td>", strings::ELIDED)?;
                    }
                }
            }
            writeln!(out, "</tr>")?;
        }

        writeln!(out, "</tbody></table></div>")
    }
}

/// Read up to `preview_rows` lines from `source` and annotate them.
///
/// Line numbers count the header as line 1. Cells are trimmed. A row is
/// flagged when its `comment` cell is missing or empty, and when its
/// context cannot be resolved. Never writes to `store`. The source is
/// closed but its stored upload is kept for the commit pass.
pub fn build_preview<S, R>(
    source: &mut S,
    store: &R,
    columns: &[String],
    preview_rows: usize,
) -> Result<Preview, UploadError>
where
    S: ImportSource + ?Sized,
    R: RecordStore + ?Sized,
{
    // A repeated column name reads its last cell, as the commit pass does.
    let comment_idx = columns.iter().rposition(|c| c == COMMENT);
    let level_idx = columns.iter().rposition(|c| c == CONTEXT_LEVEL);
    let instance_idx = columns.iter().rposition(|c| c == CONTEXT_ID);

    source.init()?;

    let mut rows = Vec::new();
    let mut linenum = 1; // Column header is first line.
    while linenum <= preview_rows {
        let Some(fields) = source.next_row()? else {
            break;
        };
        linenum += 1;

        let mut cells: Vec<String> = fields.iter().map(|f| f.trim().to_string()).collect();
        let mut status = Vec::new();

        let has_comment = comment_idx
            .and_then(|i| cells.get(i))
            .is_some_and(|c| !c.is_empty());
        if !has_comment {
            status.push(strings::MISSING_COMMENT.to_string());
        }

        if let Some(li) = level_idx.filter(|&i| i < cells.len()) {
            let instance = instance_idx
                .and_then(|i| cells.get(i))
                .cloned()
                .unwrap_or_default();
            let resolution = resolve(store, &cells[li], &instance)?;

            cells[li] = resolution.context;
            if let Some(cell) = instance_idx.and_then(|i| cells.get_mut(i)) {
                *cell = resolution.instance;
            }
            if let Some(problem) = resolution.status {
                status.push(problem.to_string());
            }
        }

        rows.push(PreviewRow::Data { line: linenum, cells, status });
    }

    if let Some(fields) = source.next_row()? {
        rows.push(PreviewRow::Elided { width: fields.len() + 2 });
    }
    source.close();

    Ok(Preview { columns: columns.to_vec(), rows })
}
