//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer and the single
//! entry point for every cuppa operation, whatever the UI.
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Dispatches** to the appropriate command function
//! - **Normalizes inputs** (drafts become expenses with fresh ids, paths become
//!   export targets)
//! - **Returns structured types** (`Result<CmdResult>`)
//!
//! It never prints, never formats for a terminal and holds no business logic.
//!
//! ## Generic Over ExpenseStore
//!
//! `CuppaApi<S: ExpenseStore>` is generic over the storage backend:
//! - Production: `CuppaApi<CsvFileStore>`, `CuppaApi<RemoteSnapshotStore<GitHubContentApi>>`,
//!   or `CuppaApi<Box<dyn ExpenseStore>>` when the backend is picked at runtime
//! - Testing: `CuppaApi<InMemoryStore>`
//!
//! ## Testing Strategy
//!
//! API tests verify dispatch and argument handling only. Command logic is
//! tested in `commands/*.rs` and storage behavior in `store/`.

use crate::codec::Dialect;
use crate::commands;
use crate::error::Result;
use crate::model::{Expense, ExpenseDraft};
use crate::store::ExpenseStore;
use chrono::NaiveDate;
use std::path::PathBuf;

pub use commands::config::ConfigAction;
pub use commands::{CmdMessage, CmdResult, CuppaPaths, MessageLevel, Summary};
pub use commands::export::ExportTarget;
pub use commands::list::{ListOptions, SortOrder};

/// The main API facade for cuppa operations.
pub struct CuppaApi<S: ExpenseStore> {
    store: S,
    paths: commands::CuppaPaths,
    dialect: Dialect,
}

impl<S: ExpenseStore> CuppaApi<S> {
    pub fn new(store: S, paths: commands::CuppaPaths) -> Self {
        Self {
            store,
            paths,
            dialect: Dialect::default(),
        }
    }

    /// CSV dialect used for import and export.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list_expenses(&self, options: &ListOptions) -> Result<commands::CmdResult> {
        commands::list::run(&self.store, options)
    }

    pub fn add_expense(&mut self, expense: Expense) -> Result<commands::CmdResult> {
        commands::add::run(&mut self.store, expense)
    }

    /// Adds a draft under a freshly generated id.
    pub fn create_expense(&mut self, draft: ExpenseDraft) -> Result<commands::CmdResult> {
        self.add_expense(Expense::new(draft))
    }

    /// Expands a unique id prefix to the stored id for UIs that accept short ids.
    pub fn resolve_id(&self, needle: &str) -> Result<Option<String>> {
        commands::view::resolve(&self.store, needle)
    }

    /// Replaces the expense with exactly this id.
    pub fn update_expense(&mut self, id: &str, draft: ExpenseDraft) -> Result<commands::CmdResult> {
        commands::update::run(&mut self.store, id, draft)
    }

    pub fn delete_expense(&mut self, id: &str) -> Result<commands::CmdResult> {
        self.delete_expenses(&[id])
    }

    /// Deletes by exact id; absent ids are a no-op.
    pub fn delete_expenses<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<commands::CmdResult> {
        let ids: Vec<String> = ids.iter().map(|i| i.as_ref().to_string()).collect();
        commands::delete::run(&mut self.store, &ids)
    }

    pub fn view_expense(&self, id: &str) -> Result<commands::CmdResult> {
        commands::view::run(&self.store, id)
    }

    pub fn import_csv(&mut self, paths: &[PathBuf]) -> Result<commands::CmdResult> {
        commands::import::run(&mut self.store, paths, self.dialect)
    }

    pub fn import_csv_text(&mut self, text: &str) -> Result<commands::CmdResult> {
        commands::import::run_text(&mut self.store, text, self.dialect)
    }

    pub fn export_csv(&self, target: ExportTarget, today: NaiveDate) -> Result<commands::CmdResult> {
        commands::export::run(&self.store, target, self.dialect, today)
    }

    pub fn summary(&self) -> Result<commands::CmdResult> {
        commands::summary::run(&self.store)
    }

    pub fn config(&self, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&self.paths, action)
    }

    pub fn init(&self) -> Result<commands::CmdResult> {
        commands::init::run(&self.paths, &self.store)
    }
}
