//! # CSV Codec
//!
//! Maps a record set to CSV text and back, using the fixed column order
//! `id,type,location,price,date,notes`. The same routines back the CSV file
//! store and user-facing import/export, so a file written by one is always
//! readable by the other.
//!
//! ## Dialects
//!
//! - [`Dialect::Legacy`]: a field is quoted if and only if it contains a comma.
//!   Embedded quotes and newlines are written as-is. On decode every `"`
//!   toggles quoted mode and is dropped, and records are split on line breaks.
//! - [`Dialect::Rfc4180`] (default): a field is quoted when it contains a
//!   comma, a quote, CR or LF, and embedded quotes are doubled. Quoted fields
//!   may span lines.
//!
//! For records free of quotes and line breaks both dialects write identical
//! bytes, so switching dialects never breaks existing files.
//!
//! ## Best Effort
//!
//! Decoding never fails. The first line is the header and decides which column
//! feeds which field, so columns may be reordered. Unknown columns are ignored,
//! missing cells become empty strings, and blank lines are skipped. Malformed
//! input (an unbalanced quote, a missing header) yields a wrong mapping rather
//! than an error.

use crate::error::{CuppaError, Result};
use crate::model::{Expense, FIELDS};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Legacy,
    #[default]
    Rfc4180,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Legacy => "legacy",
            Dialect::Rfc4180 => "rfc4180",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = CuppaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(Dialect::Legacy),
            "rfc4180" | "rfc" => Ok(Dialect::Rfc4180),
            other => Err(CuppaError::Config(format!(
                "Unknown CSV dialect '{}' (expected legacy or rfc4180)",
                other
            ))),
        }
    }
}

/// The header row alone, as written into a fresh store.
pub fn header_line() -> String {
    let mut line = FIELDS.join(",");
    line.push('\n');
    line
}

pub fn encode(records: &[Expense], dialect: Dialect) -> String {
    let mut out = header_line();
    for record in records {
        let row: Vec<Cow<'_, str>> = FIELDS
            .iter()
            .map(|name| encode_field(record.field(name).unwrap_or_default(), dialect))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

fn encode_field(value: &str, dialect: Dialect) -> Cow<'_, str> {
    match dialect {
        Dialect::Legacy => {
            if value.contains(',') {
                Cow::Owned(format!("\"{}\"", value))
            } else {
                Cow::Borrowed(value)
            }
        }
        Dialect::Rfc4180 => {
            if value.contains([',', '"', '\n', '\r']) {
                Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
            } else {
                Cow::Borrowed(value)
            }
        }
    }
}

pub fn decode(text: &str, dialect: Dialect) -> Vec<Expense> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rows = match dialect {
        Dialect::Legacy => split_legacy(text),
        Dialect::Rfc4180 => split_rfc4180(text),
    };

    let mut rows = rows.into_iter();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells.into_iter().map(|c| c.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    rows.map(|values| {
        let mut expense = Expense::default();
        for (name, value) in header.iter().zip(values) {
            expense.set_field(name, value);
        }
        expense
    })
    .collect()
}

/// Header first, then every non-blank line.
fn split_legacy(text: &str) -> Vec<Vec<String>> {
    let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
    let Some(header) = lines.next() else {
        return Vec::new();
    };

    let mut rows = vec![scan_legacy_line(header)];
    rows.extend(
        lines
            .filter(|line| !line.trim().is_empty())
            .map(scan_legacy_line),
    );
    rows
}

fn scan_legacy_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => values.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

fn split_rfc4180(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut saw_quote = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if at_field_start => {
                in_quotes = true;
                saw_quote = true;
                at_field_start = false;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                at_field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_record(&mut rows, &mut row, &mut field, saw_quote);
                at_field_start = true;
                saw_quote = false;
            }
            _ => {
                field.push(c);
                at_field_start = false;
            }
        }
    }
    finish_record(&mut rows, &mut row, &mut field, saw_quote);
    rows
}

fn finish_record(
    rows: &mut Vec<Vec<String>>,
    row: &mut Vec<String>,
    field: &mut String,
    saw_quote: bool,
) {
    let blank = row.is_empty() && !saw_quote && field.trim().is_empty();
    let last = std::mem::take(field);
    if blank {
        return;
    }
    row.push(last);
    rows.push(std::mem::take(row));
}
