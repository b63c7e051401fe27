//! # Result Rendering
//!
//! Turns a [`QueryResult`] into text for stdout, either as a box-drawn table
//! or as JSON.

use anyhow::Result;
use crossterm::style::Stylize;
use serde::Serialize;
use serde_json::Value;

use crate::executor::{QueryResult, Row};
use crate::pagination::PageWindow;

/// Maximum column width before truncation
const MAX_COLUMN_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Table,
    Json,
}

impl OutputMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Table => Self::Json,
            Self::Json => Self::Table,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Json => "JSON",
        }
    }
}

/// Presentation boundary used by the interactive and piped runners
pub trait ResultRenderer {
    fn render(&self, result: &QueryResult, mode: OutputMode) -> Result<String>;
}

/// JSON document emitted for a page of results
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultDocument<'a> {
    items: &'a [Row],
    count: Option<u64>,
    has_more: bool,
    offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_results: Option<u64>,
}

impl<'a> ResultDocument<'a> {
    fn new(result: &'a QueryResult) -> Self {
        let window: &PageWindow = &result.window;
        Self {
            items: &result.rows,
            count: result.count,
            has_more: window.has_more().unwrap_or(false),
            offset: window.offset(),
            limit: window.limit(),
            total_results: window.total_results(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableRenderer {
    color: bool,
    compact_json: bool,
}

impl TableRenderer {
    pub fn new(color: bool, compact_json: bool) -> Self {
        Self {
            color,
            compact_json,
        }
    }

    fn render_json(&self, result: &QueryResult) -> Result<String> {
        let document = ResultDocument::new(result);
        let text = if self.compact_json {
            serde_json::to_string(&document)?
        } else {
            serde_json::to_string_pretty(&document)?
        };
        Ok(text)
    }

    fn render_table(&self, result: &QueryResult) -> String {
        let columns = column_names(&result.rows);
        if columns.is_empty() {
            return format!("(0 rows)\n{}", self.footer(result));
        }

        let cells: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| truncate_value(&cell_text(row.get(col)), MAX_COLUMN_WIDTH))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = columns
            .iter()
            .map(|c| c.chars().count().min(MAX_COLUMN_WIDTH))
            .collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut output = String::new();
        output.push_str(&border('┌', '┬', '┐', &widths));

        output.push('│');
        for (i, col) in columns.iter().enumerate() {
            let name = pad(&truncate_value(col, MAX_COLUMN_WIDTH), widths[i]);
            if self.color {
                output.push_str(&format!(" {} │", name.bold()));
            } else {
                output.push_str(&format!(" {name} │"));
            }
        }
        output.push('\n');
        output.push_str(&border('├', '┼', '┤', &widths));

        for row in &cells {
            output.push('│');
            for (i, cell) in row.iter().enumerate() {
                output.push_str(&format!(" {} │", pad(cell, widths[i])));
            }
            output.push('\n');
        }

        output.push_str(&border('└', '┴', '┘', &widths));
        output.push_str(&self.footer(result));
        output
    }

    fn footer(&self, result: &QueryResult) -> String {
        let window = &result.window;
        let first = window.offset() + 1;
        let last = window.offset() + result.rows.len() as u64;
        let mut footer = if result.rows.is_empty() {
            format!("offset {}", window.offset())
        } else {
            format!("rows {first}-{last}")
        };
        if let Some(total) = window.total_results() {
            footer.push_str(&format!(" of {total}"));
        }
        if window.has_more() == Some(true) {
            footer.push_str(" (more: \\n next page)");
        }
        if self.color {
            footer.dim().to_string()
        } else {
            footer
        }
    }
}

impl ResultRenderer for TableRenderer {
    fn render(&self, result: &QueryResult, mode: OutputMode) -> Result<String> {
        match mode {
            OutputMode::Table => Ok(self.render_table(result)),
            OutputMode::Json => self.render_json(result),
        }
    }
}

/// Column names in first-seen order across all rows
fn column_names(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.replace(['\n', '\r'], " "),
        Some(other) => other.to_string(),
    }
}

/// Truncate a string to max width with ellipsis
fn truncate_value(value: &str, max_width: usize) -> String {
    if value.chars().count() <= max_width {
        value.to_string()
    } else {
        let take = max_width.saturating_sub(3);
        format!("{}...", value.chars().take(take).collect::<String>())
    }
}

fn pad(value: &str, width: usize) -> String {
    let fill = width.saturating_sub(value.chars().count());
    format!("{value}{}", " ".repeat(fill))
}

fn border(left: char, middle: char, right: char, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&middle.to_string()))
}
