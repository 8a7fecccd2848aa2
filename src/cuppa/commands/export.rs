use crate::codec::{self, Dialect};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CuppaError, Result};
use crate::store::ExpenseStore;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Write `coffee-expenses-<date>.csv` into this directory.
    Directory(PathBuf),
    File(PathBuf),
    /// Return the CSV in `CmdResult::csv`.
    Stdout,
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("coffee-expenses-{}.csv", today.format("%Y-%m-%d"))
}

pub fn run<S: ExpenseStore>(
    store: &S,
    target: ExportTarget,
    dialect: Dialect,
    today: NaiveDate,
) -> Result<CmdResult> {
    let snapshot = store.load_snapshot()?;
    let mut result = CmdResult::default();

    if snapshot.records.is_empty() {
        result.add_message(CmdMessage::info("No expenses to export"));
        return Ok(result);
    }

    let csv = codec::encode(&snapshot.records, dialect);
    let count = snapshot.records.len();

    let path = match target {
        ExportTarget::Stdout => {
            result.csv = Some(csv);
            return Ok(result.with_affected_expenses(snapshot.records));
        }
        ExportTarget::Directory(dir) => {
            fs::create_dir_all(&dir).map_err(CuppaError::Io)?;
            dir.join(export_filename(today))
        }
        ExportTarget::File(path) => path,
    };

    fs::write(&path, csv).map_err(CuppaError::Io)?;
    info!(path = %path.display(), count, "exported expenses");
    result.add_message(CmdMessage::success(format!(
        "Exported {} expenses to {}",
        count,
        path.display()
    )));
    result.exported_path = Some(path);
    Ok(result.with_affected_expenses(snapshot.records))
}
