//! Markdown table codec for the vocabulary file.
//!
//! # Format
//! ```markdown
//! - Total cards: 2
//! - Generated: 2025-11-08
//!
//! | ID | Card Type | Word Type | Russian | German | Extra | Example_DE | Example_RU | Notes | Audio |
//! |---|---|---|---|---|---|---|---|---|---|
//! | 1a2b3c4d | Reverse RU→DE | Noun | собака | der Hund | die Hunde | Der Hund bellt. | Собака лает. | — | Hund.wav |
//! | 5e6f7a8b | Cloze | Noun | собака | {{c1::der}} Hund | die Hunde | — | — | — | — |
//! ```
//!
//! The table starts at the first line beginning with the header prefix and
//! ends at the first blank or non-`|` line. Cells are not escaped, so a cell
//! value must not contain `|` or a line break; [`render_row`] refuses such
//! values instead of writing a corrupt row.

use crate::error::{ParseError, Result};
use crate::types::CardRecord;
use std::collections::HashMap;

/// Literal prefix identifying the vocabulary table header.
pub const CARD_HEADER_PREFIX: &str = "| ID | Card Type";

/// Vocabulary table columns, in order.
pub const CARD_COLUMNS: [&str; 10] = [
    "ID",
    "Card Type",
    "Word Type",
    "Russian",
    "German",
    "Extra",
    "Example_DE",
    "Example_RU",
    "Notes",
    "Audio",
];

const TOTAL_CARDS_PREFIX: &str = "- Total cards:";
const GENERATED_PREFIX: &str = "- Generated:";

/// Where a table lives and how wide its rows are.
#[derive(Debug, Clone, Copy)]
pub struct TableLayout {
    pub header_prefix: &'static str,
    pub arity: usize,
}

/// Layout of the vocabulary table.
pub const CARD_TABLE: TableLayout = TableLayout {
    header_prefix: CARD_HEADER_PREFIX,
    arity: CARD_COLUMNS.len(),
};

/// A row skipped because its column count is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWarning {
    /// 1-based line number.
    pub line: usize,
    pub found: usize,
    pub expected: usize,
    pub preview: String,
}

impl std::fmt::Display for RowWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Line {} has {} columns (expected {}), skipping: {}...",
            self.line, self.found, self.expected, self.preview
        )
    }
}

/// A well-formed table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number.
    pub line: usize,
    pub cells: Vec<String>,
}

/// Result of scanning one table out of a document.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// 0-based index of the header line.
    pub header_index: usize,
    /// 0-based index of the first line after the table.
    pub end_index: usize,
    pub rows: Vec<Row>,
    pub warnings: Vec<RowWarning>,
}

impl ParsedTable {
    /// Number of body lines, well-formed or not.
    pub fn body_len(&self) -> usize {
        self.end_index - (self.header_index + 2)
    }
}

/// Split one `| a | b |` line into trimmed cells, dropping the outer edges.
pub fn split_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('|')
        && line.contains('-')
        && line.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn preview(line: &str) -> String {
    line.chars().take(50).collect()
}

/// Locate a table by its header prefix and split its body into rows.
///
/// Rows with the wrong number of cells are reported in `warnings` and left
/// out of `rows`. Parsing never mutates `content`.
pub fn parse_table(content: &str, layout: TableLayout) -> Result<ParsedTable> {
    let lines: Vec<&str> = content.split('\n').collect();

    let header_index = lines
        .iter()
        .position(|line| line.starts_with(layout.header_prefix))
        .ok_or_else(|| ParseError::HeaderNotFound {
            prefix: layout.header_prefix.to_string(),
        })?;

    match lines.get(header_index + 1) {
        Some(line) if is_separator(line) => {}
        _ => {
            return Err(ParseError::MissingSeparator {
                line: header_index + 1,
            })
        }
    }

    let mut rows = Vec::new();
    let mut warnings = Vec::new();
    let mut end_index = lines.len();

    for (idx, raw) in lines.iter().enumerate().skip(header_index + 2) {
        let line = raw.trim();
        if line.is_empty() || !line.starts_with('|') {
            end_index = idx;
            break;
        }

        let cells = split_row(line);
        if cells.len() != layout.arity {
            warnings.push(RowWarning {
                line: idx + 1,
                found: cells.len(),
                expected: layout.arity,
                preview: preview(line),
            });
            continue;
        }

        rows.push(Row {
            line: idx + 1,
            cells,
        });
    }

    Ok(ParsedTable {
        header_index,
        end_index,
        rows,
        warnings,
    })
}

/// Vocabulary table contents.
#[derive(Debug, Clone)]
pub struct CardTable {
    pub records: Vec<CardRecord>,
    pub warnings: Vec<RowWarning>,
}

impl CardTable {
    /// IDs that occur more than once, with their counts, sorted by ID.
    pub fn duplicate_ids(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            *counts.entry(record.id.as_str()).or_default() += 1;
        }
        let mut dups: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(_, n)| *n > 1)
            .map(|(id, n)| (id.to_string(), n))
            .collect();
        dups.sort();
        dups
    }
}

/// Parse the vocabulary table into card records.
pub fn parse_cards(content: &str) -> Result<CardTable> {
    let table = parse_table(content, CARD_TABLE)?;
    let records = table
        .rows
        .into_iter()
        .filter_map(|row| <[String; 10]>::try_from(row.cells).ok())
        .map(CardRecord::from_cells)
        .collect();

    Ok(CardTable {
        records,
        warnings: table.warnings,
    })
}

fn check_cell(id: &str, field: &'static str, value: &str) -> Result<()> {
    let found = if value.contains('|') {
        "a pipe character"
    } else if value.contains('\n') || value.contains('\r') {
        "a line break"
    } else {
        return Ok(());
    };
    Err(ParseError::UnrepresentableCell {
        id: id.to_string(),
        field,
        found,
    })
}

/// Join cells into a `| a | b |` line without any validation.
pub fn join_cells<S: AsRef<str>>(cells: &[S]) -> String {
    let mut line = String::from("|");
    for cell in cells {
        line.push(' ');
        line.push_str(cell.as_ref());
        line.push_str(" |");
    }
    line
}

/// Render one card as a table row in column order.
pub fn render_row(record: &CardRecord) -> Result<String> {
    let cells = record.cells();
    for (field, value) in cells {
        check_cell(&record.id, field, value)?;
    }
    let values: Vec<&str> = cells.iter().map(|(_, value)| *value).collect();
    Ok(join_cells(&values))
}

/// Insert rows directly after the last line of the vocabulary table.
///
/// Returns the new document; `content` is left untouched.
pub fn append_rows(content: &str, rows: &[String]) -> Result<String> {
    let table = parse_table(content, CARD_TABLE)?;
    let mut lines: Vec<&str> = content.split('\n').collect();
    let at = table.end_index.min(lines.len());
    lines.splice(at..at, rows.iter().map(String::as_str));
    Ok(lines.join("\n"))
}

/// Number of body rows in the vocabulary table, malformed ones included.
pub fn count_table_rows(content: &str) -> Result<usize> {
    Ok(parse_table(content, CARD_TABLE)?.body_len())
}

/// Value of the `- Total cards:` metadata line, if present and numeric.
pub fn metadata_total(content: &str) -> Option<usize> {
    content
        .split('\n')
        .find_map(|line| line.strip_prefix(TOTAL_CARDS_PREFIX))
        .and_then(|rest| rest.trim().parse().ok())
}

/// What [`refresh_metadata`] changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub previous_total: Option<usize>,
    pub total: usize,
    pub total_line_found: bool,
    pub generated_line_found: bool,
}

/// Rewrite `- Total cards:` with the real row count and `- Generated:` with
/// `today`. Only the first occurrence of each line is touched.
pub fn refresh_metadata(content: &str, today: &str) -> Result<(String, MetadataUpdate)> {
    let total = count_table_rows(content)?;
    let previous_total = metadata_total(content);

    let mut total_line_found = false;
    let mut generated_line_found = false;
    let mut out = Vec::new();

    for line in content.split('\n') {
        if !total_line_found && line.starts_with(TOTAL_CARDS_PREFIX) {
            total_line_found = true;
            out.push(format!("{} {}", TOTAL_CARDS_PREFIX, total));
        } else if !generated_line_found && line.starts_with(GENERATED_PREFIX) {
            generated_line_found = true;
            out.push(format!("{} {}", GENERATED_PREFIX, today));
        } else {
            out.push(line.to_string());
        }
    }

    Ok((
        out.join("\n"),
        MetadataUpdate {
            previous_total,
            total,
            total_line_found,
            generated_line_found,
        },
    ))
}
