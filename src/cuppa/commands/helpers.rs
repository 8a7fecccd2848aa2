use crate::error::{CuppaError, Result};
use crate::model::{Expense, Revision, Snapshot};
use crate::store::ExpenseStore;
use tracing::debug;

/// Read-modify-write against the store.
///
/// Loads a snapshot, lets `compute` derive the next record set (or bail out
/// with an error), then commits it conditioned on the snapshot's revision.
/// `compute` returning `None` means "nothing to write" and skips the commit.
pub fn mutate<S, T, F>(store: &mut S, compute: F) -> Result<(T, Option<Revision>)>
where
    S: ExpenseStore,
    F: FnOnce(&Snapshot) -> Result<(T, Option<Vec<Expense>>)>,
{
    let snapshot = store.load_snapshot()?;
    let (outcome, next) = compute(&snapshot)?;

    let Some(next) = next else {
        debug!(location = %store.location(), "nothing changed, skipping commit");
        return Ok((outcome, None));
    };

    let revision = store.commit(&snapshot, &next)?;
    Ok((outcome, Some(revision)))
}

/// Resolve an exact id or a unique id prefix to the full id.
pub fn resolve_id(records: &[Expense], needle: &str) -> Result<Option<String>> {
    let needle = needle.trim();
    if needle.is_empty() {
        return Err(CuppaError::Api("Expense id cannot be empty".to_string()));
    }

    if let Some(exact) = records.iter().find(|e| e.id == needle) {
        return Ok(Some(exact.id.clone()));
    }

    let mut matches = records.iter().filter(|e| e.id.starts_with(needle));
    match (matches.next(), matches.next()) {
        (None, _) => Ok(None),
        (Some(only), None) => Ok(Some(only.id.clone())),
        (Some(_), Some(_)) => Err(CuppaError::AmbiguousId(needle.to_string())),
    }
}

/// Like [`resolve_id`], but a miss is `NotFound`.
pub fn require_id(records: &[Expense], needle: &str) -> Result<String> {
    resolve_id(records, needle)?.ok_or_else(|| CuppaError::NotFound(needle.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{expense, StoreFixture};
    use crate::store::memory::InMemoryStore;

    fn records() -> Vec<Expense> {
        vec![
            expense("abc123", "Latte", "A", "1", "2024-01-01"),
            expense("abd456", "Mocha", "A", "1", "2024-01-01"),
            expense("ab", "Tea", "A", "1", "2024-01-01"),
        ]
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        assert_eq!(resolve_id(&records(), "ab").unwrap().as_deref(), Some("ab"));
    }

    #[test]
    fn unique_prefix_resolves() {
        assert_eq!(
            resolve_id(&records(), "abc").unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn shared_prefix_is_ambiguous() {
        let records = records()[..2].to_vec();
        assert!(matches!(
            resolve_id(&records, "ab"),
            Err(CuppaError::AmbiguousId(_))
        ));
    }

    #[test]
    fn miss_is_none_or_not_found() {
        assert_eq!(resolve_id(&records(), "zzz").unwrap(), None);
        assert!(matches!(
            require_id(&records(), "zzz"),
            Err(CuppaError::NotFound(_))
        ));
        assert!(resolve_id(&records(), " ").is_err());
    }

    #[test]
    fn mutate_skips_commit_when_unchanged() {
        let mut fixture = StoreFixture::new().with_expenses(1);
        let before = fixture.store.load_snapshot().unwrap().revision;
        let (_, revision) = mutate(&mut fixture.store, |_| Ok(((), None))).unwrap();
        assert!(revision.is_none());
        assert_eq!(fixture.store.load_snapshot().unwrap().revision, before);
    }

    #[test]
    fn mutate_commits_next_set() {
        let mut store = InMemoryStore::new();
        let (count, revision) = mutate(&mut store, |snap| {
            let mut next = snap.records.clone();
            next.push(expense("n1", "Latte", "A", "1", "2024-01-01"));
            Ok((next.len(), Some(next)))
        })
        .unwrap();
        assert_eq!(count, 1);
        assert!(revision.is_some());
        assert_eq!(store.records().len(), 1);
    }
}
