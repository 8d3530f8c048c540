//! Plain-text table rendering shared by the CSV and spreadsheet handlers.
//!
//! Output looks like a data-frame dump: a left-aligned row index, then every
//! column right-aligned to its widest cell, columns two spaces apart.

use std::collections::HashMap;

/// Placeholder for a cell with no value.
pub const MISSING: &str = "NaN";

const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from a raw header row. Blank names become
    /// `Unnamed: <i>` and repeated names get a `.1`, `.2`, ... suffix.
    pub fn with_header<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let columns = header
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let raw = raw.as_ref().trim();
                let base = if raw.is_empty() {
                    format!("Unnamed: {}", idx)
                } else {
                    raw.to_string()
                };
                let count = seen.entry(base.clone()).or_insert(0);
                let name = if *count == 0 { base } else { format!("{}.{}", base, count) };
                *count += 1;
                name
            })
            .collect();

        Self { columns, rows: Vec::new() }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Append a row, padding short rows with [`MISSING`]. Blank cells are
    /// stored as [`MISSING`] too. Extra cells beyond the header are dropped;
    /// callers that must reject them check the length first.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(|cell| {
                let cell = cell.into();
                if cell.is_empty() {
                    MISSING.to_string()
                } else {
                    cell
                }
            })
            .collect();
        row.resize(self.columns.len(), MISSING.to_string());
        self.rows.push(row);
    }

    pub fn render(&self) -> String {
        if self.rows.is_empty() || self.columns.is_empty() {
            return format!(
                "Empty DataFrame\nColumns: [{}]\nIndex: [{}]",
                self.columns.join(", "),
                (0..self.rows.len()).map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
            );
        }

        let index_width = (self.rows.len() - 1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                self.rows
                    .iter()
                    .map(|row| display_width(&row[col]))
                    .chain(std::iter::once(display_width(name)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(index_width));
        for (name, width) in self.columns.iter().zip(&widths) {
            out.push_str(COLUMN_GAP);
            push_right_aligned(&mut out, name, *width);
        }

        for (idx, row) in self.rows.iter().enumerate() {
            out.push('\n');
            let label = idx.to_string();
            out.push_str(&label);
            out.push_str(&" ".repeat(index_width - label.len()));
            for (cell, width) in row.iter().zip(&widths) {
                out.push_str(COLUMN_GAP);
                push_right_aligned(&mut out, cell, *width);
            }
        }

        out
    }
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn push_right_aligned(out: &mut String, value: &str, width: usize) {
    let pad = width.saturating_sub(display_width(value));
    out.push_str(&" ".repeat(pad));
    out.push_str(value);
}
