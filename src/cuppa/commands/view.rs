use crate::commands::CmdResult;
use crate::error::Result;
use crate::store::ExpenseStore;

use super::helpers::{require_id, resolve_id};

/// Shows one expense. `id` may be a unique prefix.
pub fn run<S: ExpenseStore>(store: &S, id: &str) -> Result<CmdResult> {
    let snapshot = store.load_snapshot()?;
    let id = require_id(&snapshot.records, id)?;
    let expense = snapshot.records.into_iter().filter(|e| e.id == id).collect();
    Ok(CmdResult::default().with_listed_expenses(expense))
}

/// Expands an exact id or unique prefix to the stored id, `None` on a miss.
pub fn resolve<S: ExpenseStore>(store: &S, needle: &str) -> Result<Option<String>> {
    let snapshot = store.load_snapshot()?;
    resolve_id(&snapshot.records, needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CuppaError;
    use crate::store::memory::fixtures::StoreFixture;

    #[test]
    fn views_by_exact_id() {
        let fixture = StoreFixture::new().with_expenses(2);
        let res = run(&fixture.store, "id-2").unwrap();
        assert_eq!(res.listed_expenses.len(), 1);
        assert_eq!(res.listed_expenses[0].kind, "Coffee 2");
    }

    #[test]
    fn unknown_id_is_not_found() {
        let fixture = StoreFixture::new().with_expenses(1);
        assert!(matches!(
            run(&fixture.store, "zzz"),
            Err(CuppaError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_expands_unique_prefix() {
        let mut fixture = StoreFixture::new();
        fixture
            .store
            .save(&[crate::store::memory::fixtures::expense(
                "abc123", "Latte", "A", "1", "2024-01-01",
            )])
            .unwrap();
        assert_eq!(
            resolve(&fixture.store, "abc").unwrap().as_deref(),
            Some("abc123")
        );
        assert_eq!(resolve(&fixture.store, "zzz").unwrap(), None);
    }
}
