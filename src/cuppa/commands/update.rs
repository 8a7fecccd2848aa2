use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CuppaError, Result};
use crate::model::{Expense, ExpenseDraft};
use crate::store::ExpenseStore;
use tracing::info;

use super::helpers::mutate;

/// Replaces every field but the id of one expense.
///
/// `id` must match exactly. Fails with `NotFound` when no expense has it.
pub fn run<S: ExpenseStore>(store: &mut S, id: &str, draft: ExpenseDraft) -> Result<CmdResult> {
    draft.validate()?;

    let (updated, _) = mutate(store, |snapshot| {
        if !snapshot.records.iter().any(|e| e.id == id) {
            return Err(CuppaError::NotFound(id.to_string()));
        }
        let updated = Expense::with_id(id, draft);
        let next = snapshot
            .records
            .iter()
            .map(|e| {
                if e.id == updated.id {
                    updated.clone()
                } else {
                    e.clone()
                }
            })
            .collect();
        Ok((updated, Some(next)))
    })?;

    info!(id = %updated.id, "updated expense");
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Expense updated successfully ({})",
        updated.short_id()
    )));
    Ok(result.with_affected_expenses(vec![updated]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn only_the_target_changes() {
        let mut fixture = StoreFixture::new().with_expenses(3);
        let before = fixture.store.records().to_vec();

        let draft = ExpenseDraft::new("Cortado", "Cafe Z", "99", "2024-02-02").with_notes("hot");
        run(&mut fixture.store, "id-2", draft).unwrap();

        let after = fixture.store.records();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[2]);
        assert_eq!(after[1].id, "id-2");
        assert_eq!(after[1].kind, "Cortado");
        assert_eq!(after[1].notes, "hot");
    }

    #[test]
    fn order_is_preserved() {
        let mut fixture = StoreFixture::new().with_expenses(3);
        let draft = fixture.store.records()[0].draft();
        run(&mut fixture.store, "id-1", draft).unwrap();
        let ids: Vec<_> = fixture.store.records().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["id-1", "id-2", "id-3"]);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut fixture = StoreFixture::new().with_expenses(1);
        let draft = ExpenseDraft::new("Latte", "A", "1", "2024-01-01");
        let err = run(&mut fixture.store, "missing", draft).unwrap_err();
        assert!(matches!(err, CuppaError::NotFound(_)));
    }

    #[test]
    fn prefix_of_an_id_is_not_found() {
        let mut fixture = StoreFixture::new().with_expenses(1);
        let before = fixture.store.records().to_vec();
        let draft = ExpenseDraft::new("Mocha", "A", "1", "2024-01-01");
        let err = run(&mut fixture.store, "id-", draft).unwrap_err();
        assert!(matches!(err, CuppaError::NotFound(_)));
        assert_eq!(fixture.store.records(), before.as_slice());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut fixture = StoreFixture::new().with_expenses(1);
        let draft = ExpenseDraft::new("", "A", "1", "2024-01-01");
        assert!(matches!(
            run(&mut fixture.store, "id-1", draft),
            Err(CuppaError::MissingField("type"))
        ));
    }
}
