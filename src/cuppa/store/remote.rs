use super::content_api::ContentApi;
use super::ExpenseStore;
use crate::error::{CuppaError, Result};
use crate::model::{Expense, Revision, Snapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

pub const DEFAULT_REMOTE_PATH: &str = "data/coffee-expenses.json";

/// Expenses persisted as a pretty-printed JSON array behind a [`ContentApi`].
///
/// Every mutation pushes the whole array as a new revision of one file.
pub struct RemoteSnapshotStore<A: ContentApi> {
    api: A,
    path: String,
}

impl<A: ContentApi> RemoteSnapshotStore<A> {
    pub fn new(api: A, path: impl Into<String>) -> Self {
        Self {
            api,
            path: path.into(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Expense>> {
        Ok(self.load_snapshot()?.records)
    }

    /// Revision currently stored remotely, `None` for a file that does not exist yet.
    pub fn fetch_revision(&self) -> Result<Option<Revision>> {
        Ok(self.api.get_content(&self.path)?.map(|c| c.revision))
    }

    fn push(&self, records: &[Expense], base: Option<&Revision>) -> Result<Revision> {
        let body = serde_json::to_string_pretty(records)?;
        let message = commit_message(Utc::now());

        match self
            .api
            .put_content(&self.path, body.as_bytes(), base, &message)
        {
            Ok(revision) => {
                info!(
                    location = %self.location(),
                    count = records.len(),
                    revision = %revision,
                    "pushed expenses"
                );
                Ok(revision)
            }
            Err(CuppaError::Conflict(detail)) => {
                warn!(location = %self.location(), base = ?base, "remote revision is stale");
                Err(CuppaError::Conflict(format!(
                    "Failed to save expenses: {}",
                    detail
                )))
            }
            Err(e) => Err(e),
        }
    }
}

/// Commit message for a pushed snapshot.
pub fn commit_message(now: DateTime<Utc>) -> String {
    format!(
        "Update coffee expenses - {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

impl<A: ContentApi> ExpenseStore for RemoteSnapshotStore<A> {
    fn load_snapshot(&self) -> Result<Snapshot> {
        let Some(remote) = self.api.get_content(&self.path)? else {
            debug!(location = %self.location(), "remote file absent, starting empty");
            return Ok(Snapshot::empty());
        };

        let text = String::from_utf8(remote.content).map_err(|e| {
            CuppaError::Parse(format!("{} is not UTF-8: {}", self.location(), e))
        })?;
        let records: Vec<Expense> = if text.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&text)?
        };

        debug!(
            location = %self.location(),
            count = records.len(),
            revision = %remote.revision,
            "loaded remote snapshot"
        );
        Ok(Snapshot::new(records, Some(remote.revision)))
    }

    fn commit(&mut self, base: &Snapshot, next: &[Expense]) -> Result<Revision> {
        self.push(next, base.revision.as_ref())
    }

    fn save(&mut self, records: &[Expense]) -> Result<Revision> {
        let current = self.fetch_revision()?;
        self.push(records, current.as_ref())
    }

    fn location(&self) -> String {
        self.api.describe(&self.path)
    }
}
