use crate::commands::{CmdMessage, CmdResult, Summary};
use crate::error::{CuppaError, Result};
use crate::model::Expense;
use crate::store::ExpenseStore;
use std::fmt;
use std::str::FromStr;
use tracing::error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest date first.
    #[default]
    Date,
    DateAsc,
    /// Storage order, untouched.
    Stored,
}

impl FromStr for SortOrder {
    type Err = CuppaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "date" => Ok(SortOrder::Date),
            "date-asc" => Ok(SortOrder::DateAsc),
            "stored" => Ok(SortOrder::Stored),
            other => Err(CuppaError::Api(format!("Unknown sort order: {}", other))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Date => "date",
            SortOrder::DateAsc => "date-asc",
            SortOrder::Stored => "stored",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Case-insensitive substring matched against type, location and notes.
    pub search: Option<String>,
    pub sort: SortOrder,
}

/// Lists expenses for display.
///
/// A failed read does not fail the command: the listing comes back empty with
/// `load_failed` set and an error message attached.
pub fn run<S: ExpenseStore>(store: &S, options: &ListOptions) -> Result<CmdResult> {
    let records = match store.load_snapshot() {
        Ok(snapshot) => snapshot.records,
        Err(e) => {
            error!(location = %store.location(), error = %e, "failed to load expenses");
            let mut result = CmdResult::default().with_summary(Summary::default());
            result.load_failed = true;
            result.add_message(CmdMessage::error(format!(
                "Failed to load expenses: {}",
                e
            )));
            return Ok(result);
        }
    };

    let mut listed: Vec<Expense> = match options.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            let term = term.to_lowercase();
            records
                .into_iter()
                .filter(|e| matches_term(e, &term))
                .collect()
        }
        _ => records,
    };

    match options.sort {
        SortOrder::Date => listed.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::DateAsc => listed.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::Stored => {}
    }

    let summary = Summary::from_records(&listed);
    Ok(CmdResult::default()
        .with_summary(summary)
        .with_listed_expenses(listed))
}

fn matches_term(expense: &Expense, term: &str) -> bool {
    [&expense.kind, &expense.location, &expense.notes]
        .iter()
        .any(|field| field.to_lowercase().contains(term))
}
