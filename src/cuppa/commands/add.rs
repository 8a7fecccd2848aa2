use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CuppaError, Result};
use crate::model::Expense;
use crate::store::ExpenseStore;
use tracing::info;

use super::helpers::mutate;

/// Appends a fully formed expense. The id comes from the caller.
pub fn run<S: ExpenseStore>(store: &mut S, expense: Expense) -> Result<CmdResult> {
    expense.validate()?;

    let (added, _) = mutate(store, |snapshot| {
        if snapshot.contains(&expense.id) {
            return Err(CuppaError::DuplicateId(expense.id.clone()));
        }
        let mut next = snapshot.records.clone();
        next.push(expense.clone());
        Ok((expense, Some(next)))
    })?;

    info!(id = %added.id, "added expense");
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "New expense added successfully ({})",
        added.short_id()
    )));
    Ok(result.with_affected_expenses(vec![added]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExpenseDraft;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::InMemoryStore;
    use std::collections::HashSet;

    fn draft() -> ExpenseDraft {
        ExpenseDraft::new("Latte", "Cafe A", "150", "2024-01-01")
    }

    #[test]
    fn adds_with_generated_ids() {
        let mut store = InMemoryStore::new();
        for _ in 0..5 {
            run(&mut store, Expense::new(draft())).unwrap();
        }
        let ids: HashSet<_> = store.records().iter().map(|e| e.id.clone()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn returns_the_added_expense() {
        let mut store = InMemoryStore::new();
        let res = run(&mut store, Expense::with_id("x1", draft())).unwrap();
        assert_eq!(res.affected_expenses[0].id, "x1");
        assert_eq!(store.records()[0].kind, "Latte");
    }

    #[test]
    fn colliding_id_is_rejected() {
        let mut fixture = StoreFixture::new().with_expenses(1);
        let err = run(&mut fixture.store, Expense::with_id("id-1", draft())).unwrap_err();
        assert!(matches!(err, CuppaError::DuplicateId(id) if id == "id-1"));
        assert_eq!(fixture.store.records().len(), 1);
    }

    #[test]
    fn missing_required_field_is_rejected_before_io() {
        let mut store = InMemoryStore::new();
        store.set_simulate_read_error(true);
        let mut bad = draft();
        bad.location.clear();
        let err = run(&mut store, Expense::new(bad)).unwrap_err();
        assert!(matches!(err, CuppaError::MissingField("location")));
    }

    #[test]
    fn write_failure_propagates() {
        let mut store = InMemoryStore::new();
        store.set_simulate_write_error(true);
        assert!(run(&mut store, Expense::new(draft())).is_err());
        assert!(store.records().is_empty());
    }
}
