use super::ExpenseStore;
use crate::error::{CuppaError, Result};
use crate::model::{Expense, Revision, Snapshot};
use std::cell::Cell;

/// In-memory storage for testing command logic without I/O.
///
/// Revisions are a simple write counter. `Cell` is enough for the flags since
/// cuppa is single-threaded.
#[derive(Default)]
pub struct InMemoryStore {
    records: Vec<Expense>,
    writes: u64,
    simulate_write_error: Cell<bool>,
    simulate_read_error: Cell<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expenses(records: Vec<Expense>) -> Self {
        Self {
            records,
            writes: 1,
            ..Self::default()
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    pub fn set_simulate_read_error(&self, simulate: bool) {
        self.simulate_read_error.set(simulate);
    }

    /// Test helper standing in for a concurrent writer.
    pub fn overwrite_behind_back(&mut self, records: Vec<Expense>) {
        self.records = records;
        self.writes += 1;
    }

    pub fn records(&self) -> &[Expense] {
        &self.records
    }

    fn revision(&self) -> Option<Revision> {
        (self.writes > 0).then(|| Revision::new(format!("mem-{}", self.writes)))
    }

    fn replace(&mut self, records: &[Expense]) -> Result<Revision> {
        if self.simulate_write_error.get() {
            return Err(CuppaError::Store("Simulated write error".to_string()));
        }
        self.records = records.to_vec();
        self.writes += 1;
        Ok(Revision::new(format!("mem-{}", self.writes)))
    }
}

impl ExpenseStore for InMemoryStore {
    fn load_snapshot(&self) -> Result<Snapshot> {
        if self.simulate_read_error.get() {
            return Err(CuppaError::Io(std::io::Error::other("Simulated read error")));
        }
        Ok(Snapshot::new(self.records.clone(), self.revision()))
    }

    fn commit(&mut self, base: &Snapshot, next: &[Expense]) -> Result<Revision> {
        if base.revision != self.revision() {
            return Err(CuppaError::Conflict(
                "in-memory store was modified".to_string(),
            ));
        }
        self.replace(next)
    }

    fn save(&mut self, records: &[Expense]) -> Result<Revision> {
        self.replace(records)
    }

    fn location(&self) -> String {
        "memory://expenses".to_string()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::ExpenseDraft;

    pub fn expense(id: &str, kind: &str, location: &str, price: &str, date: &str) -> Expense {
        Expense::with_id(id, ExpenseDraft::new(kind, location, price, date))
    }

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        pub fn with_expense(mut self, id: &str, kind: &str, price: &str, date: &str) -> Self {
            let mut records = self.store.records().to_vec();
            records.push(expense(id, kind, "Cafe A", price, date));
            self.store.save(&records).unwrap();
            self
        }

        pub fn with_expenses(mut self, count: usize) -> Self {
            for i in 0..count {
                self = self.with_expense(
                    &format!("id-{}", i + 1),
                    &format!("Coffee {}", i + 1),
                    &format!("{}", (i + 1) * 10),
                    &format!("2024-01-{:02}", i + 1),
                );
            }
            self
        }
    }
}
