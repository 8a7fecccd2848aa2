use crate::codec::{self, Dialect};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{new_expense_id, Expense};
use crate::store::ExpenseStore;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

use super::helpers::mutate;

/// A decoded row and where it came from, for warnings.
struct SourcedRow {
    source: String,
    line: usize,
    expense: Expense,
}

/// Imports CSV files. Unreadable paths are reported and skipped.
pub fn run<S: ExpenseStore>(
    store: &mut S,
    paths: &[PathBuf],
    dialect: Dialect,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    let mut rows = Vec::new();

    for path in paths {
        if !path.is_file() {
            result.add_message(CmdMessage::warning(format!(
                "Path not found: {}",
                path.display()
            )));
            continue;
        }
        match fs::read_to_string(path) {
            Ok(text) => {
                let source = path.display().to_string();
                rows.extend(sourced(&source, codec::decode(&text, dialect)));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read import file");
                result.add_message(CmdMessage::warning(format!(
                    "Failed to import: {} ({})",
                    path.display(),
                    e
                )));
            }
        }
    }

    import_rows(store, rows, &mut result)?;
    Ok(result)
}

/// Imports CSV text that is already in memory.
pub fn run_text<S: ExpenseStore>(store: &mut S, text: &str, dialect: Dialect) -> Result<CmdResult> {
    let mut result = CmdResult::default();
    import_rows(store, sourced("input", codec::decode(text, dialect)).collect(), &mut result)?;
    Ok(result)
}

fn sourced(source: &str, records: Vec<Expense>) -> impl Iterator<Item = SourcedRow> + '_ {
    records
        .into_iter()
        .enumerate()
        .map(move |(i, expense)| SourcedRow {
            source: source.to_string(),
            line: i + 1,
            expense,
        })
}

/// Accepts rows with an id (generated when blank), the required fields, and
/// an id not already stored. All accepted rows land in a single commit.
fn import_rows<S: ExpenseStore>(
    store: &mut S,
    rows: Vec<SourcedRow>,
    result: &mut CmdResult,
) -> Result<()> {
    if rows.is_empty() {
        result.add_message(CmdMessage::info("No expenses found to import"));
        return Ok(());
    }

    let ((accepted, skipped), _) = mutate(store, |snapshot| {
        let mut seen: HashSet<String> = snapshot.records.iter().map(|e| e.id.clone()).collect();
        let mut accepted = Vec::new();
        let mut skipped = Vec::new();

        for row in rows {
            let mut expense = row.expense;
            if expense.id.trim().is_empty() {
                expense.id = new_expense_id();
            }
            if let Err(e) = expense.validate() {
                skipped.push(format!("{} row {} skipped: {}", row.source, row.line, e));
                continue;
            }
            if !seen.insert(expense.id.clone()) {
                skipped.push(format!(
                    "{} row {} skipped: expense id already exists: {}",
                    row.source, row.line, expense.id
                ));
                continue;
            }
            accepted.push(expense);
        }

        let next = (!accepted.is_empty()).then(|| {
            let mut next = snapshot.records.clone();
            next.extend(accepted.iter().cloned());
            next
        });
        Ok(((accepted, skipped), next))
    })?;

    for reason in skipped {
        warn!("{}", reason);
        result.add_message(CmdMessage::warning(reason));
    }

    if accepted.is_empty() {
        result.add_message(CmdMessage::warning("No expenses imported"));
    } else {
        info!(count = accepted.len(), "imported expenses");
        result.add_message(CmdMessage::success(format!(
            "Successfully imported {} expenses",
            accepted.len()
        )));
    }
    result.affected_expenses = accepted;
    Ok(())
}
