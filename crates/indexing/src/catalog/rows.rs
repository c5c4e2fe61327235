use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use super::schema::HeadingSchema;

/// What the assembler produced from one or more physical lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowEvent {
    /// A well-formed row; `recovered` when it had to be joined from several lines
    Row { cells: Vec<String>, recovered: bool },
    /// More cells than headings, the row is dropped
    Rejected { raw: String },
    /// Input ended while a short row was still being joined
    UnexpectedEof { partial: String },
}

#[derive(Debug)]
enum RowState {
    ExpectRow,
    RecoverShortRow { pending: String, corrected: bool },
    RejectLongRow { raw: String },
}

/// Reassembles logical rows from a tab-delimited export whose cells may contain line breaks.
pub struct RowAssembler<R> {
    reader: R,
    columns: usize,
    free_text: Vec<usize>,
    seen_row: bool,
    line_number: usize,
    buf: Vec<u8>,
}

fn strip_newline(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn cell_count(line: &str) -> usize {
    strip_newline(line).split('\t').count()
}

fn split_row(line: &str) -> Vec<String> {
    let mut cells: Vec<String> = strip_newline(line).split('\t').map(str::to_string).collect();
    if let Some(last) = cells.last_mut() {
        *last = last.trim().to_string();
    }
    cells
}

impl<R: AsyncBufRead + Unpin> RowAssembler<R> {
    /// `reader` must be positioned after the header line
    pub fn new(reader: R, schema: &HeadingSchema) -> Self {
        Self {
            reader,
            columns: schema.len(),
            free_text: schema.free_text_columns().to_vec(),
            seen_row: false,
            line_number: 1,
            buf: Vec::new(),
        }
    }

    /// Physical line last read, counting the header as line 1
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    async fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    /// The tool writes an extra tab after a line break inside certain free-text cells.
    /// When the pending line ends right behind such a column, drop one leading tab of the
    /// continuation, at most once per row.
    fn free_text_correction<'a>(&self, pending: &str, continuation: &'a str, corrected: bool) -> (&'a str, bool) {
        if corrected {
            return (continuation, true);
        }
        let cells = cell_count(pending);
        if cells >= 2 && self.free_text.contains(&(cells - 2)) {
            if let Some(rest) = continuation.strip_prefix('\t') {
                return (rest, true);
            }
        }
        (continuation, false)
    }

    /// Next logical row, or `None` at the end of input
    pub async fn next_event(&mut self) -> io::Result<Option<RowEvent>> {
        let mut state = RowState::ExpectRow;

        loop {
            state = match state {
                RowState::ExpectRow => {
                    let Some(line) = self.read_line().await? else {
                        return Ok(None);
                    };
                    let cells = cell_count(&line);

                    if cells == self.columns {
                        self.seen_row = true;
                        return Ok(Some(RowEvent::Row {
                            cells: split_row(&line),
                            recovered: false,
                        }));
                    } else if cells > self.columns {
                        RowState::RejectLongRow { raw: line }
                    } else if line.trim().is_empty() {
                        debug!("Skipping empty line {}", self.line_number);
                        RowState::ExpectRow
                    } else if !self.seen_row {
                        debug!("Skipping short line {} before the first data row", self.line_number);
                        RowState::ExpectRow
                    } else {
                        RowState::RecoverShortRow {
                            pending: strip_newline(&line).to_string(),
                            corrected: false,
                        }
                    }
                }

                RowState::RecoverShortRow { pending, corrected } => {
                    let Some(next) = self.read_line().await? else {
                        return Ok(Some(RowEvent::UnexpectedEof { partial: pending }));
                    };
                    let (continuation, corrected) = self.free_text_correction(&pending, &next, corrected);
                    let joined = format!("{}{}", pending, continuation);
                    let cells = cell_count(&joined);

                    if cells == self.columns {
                        return Ok(Some(RowEvent::Row {
                            cells: split_row(&joined),
                            recovered: true,
                        }));
                    } else if cells > self.columns {
                        RowState::RejectLongRow { raw: joined }
                    } else {
                        RowState::RecoverShortRow {
                            pending: strip_newline(&joined).to_string(),
                            corrected,
                        }
                    }
                }

                RowState::RejectLongRow { raw } => {
                    return Ok(Some(RowEvent::Rejected {
                        raw: strip_newline(&raw).to_string(),
                    }));
                }
            };
        }
    }
}
