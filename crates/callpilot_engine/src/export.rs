use crate::opportunity::{OpportunityField, OpportunityRecord, NOT_AVAILABLE, TAGS_LABEL};
use crate::persist::PersistError;

pub const SOW_LABEL: &str = "SOW Details";

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Rendered export, ready to be written under `file_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no opportunity record has been extracted yet")]
    MissingOpportunity,
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Encodes the opportunity as a header row and a value row, followed by a
/// single `SOW Details` row.
///
/// Every cell is quoted with embedded quotes doubled. Record values keep their
/// newlines; the SOW text is flattened so that its row stays one line.
pub fn to_export(record: &OpportunityRecord, sow: Option<&str>) -> String {
    let mut header: Vec<&str> = OpportunityField::ALL.iter().map(|f| f.label()).collect();
    header.push(TAGS_LABEL);

    let mut values: Vec<String> = OpportunityField::ALL
        .iter()
        .map(|field| record.display(*field).to_string())
        .collect();
    values.push(record.tags_display());

    let sow = sow
        .map(flatten_block)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut out = String::new();
    push_row(&mut out, header);
    push_row(&mut out, values.iter().map(String::as_str));
    push_row(&mut out, [SOW_LABEL, sow.as_str()]);
    out
}

fn push_row<'a>(out: &mut String, cells: impl IntoIterator<Item = &'a str>) {
    for (index, cell) in cells.into_iter().enumerate() {
        if index > 0 {
            out.push(DELIMITER);
        }
        out.push(QUOTE);
        for c in cell.chars() {
            if c == QUOTE {
                out.push(QUOTE);
            }
            out.push(c);
        }
        out.push(QUOTE);
    }
    out.push('\n');
}

fn flatten_block(text: &str) -> String {
    text.trim()
        .replace("\r\n", " ")
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            DELIMITER => ';',
            other => other,
        })
        .collect()
}

/// Decodes comma-delimited text with double-quote escaping into rows of cells.
///
/// Quoted cells may contain delimiters, doubled quotes and line breaks.
pub fn parse_delimited(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    cell.push(QUOTE);
                }
                QUOTE => in_quotes = false,
                other => cell.push(other),
            }
            continue;
        }
        match c {
            QUOTE => in_quotes = true,
            DELIMITER => row.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            other => cell.push(other),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }
    rows
}
