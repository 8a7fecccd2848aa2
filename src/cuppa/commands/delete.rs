use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Expense;
use crate::store::ExpenseStore;
use tracing::info;

use super::helpers::mutate;

/// Permanently removes the expenses whose id equals one of `ids`.
///
/// Ids that match nothing are a no-op.
pub fn run<S: ExpenseStore>(store: &mut S, ids: &[String]) -> Result<CmdResult> {
    let (removed, _) = mutate(store, |snapshot| {
        let (removed, kept): (Vec<Expense>, Vec<Expense>) = snapshot
            .records
            .iter()
            .cloned()
            .partition(|e| ids.contains(&e.id));

        let next = (!removed.is_empty()).then_some(kept);
        Ok((removed, next))
    })?;

    let mut result = CmdResult::default();
    if removed.is_empty() {
        result.add_message(CmdMessage::info("No matching expenses, nothing deleted"));
    }
    for expense in &removed {
        info!(id = %expense.id, "deleted expense");
        result.add_message(CmdMessage::success(format!(
            "Expense deleted successfully ({}: {})",
            expense.short_id(),
            expense.kind
        )));
    }
    Ok(result.with_affected_expenses(removed))
}
