use super::content_api::{ContentApi, RemoteContent};
use crate::error::{CuppaError, Result};
use crate::model::Revision;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// In-memory content API for testing the remote store.
///
/// Uses `RefCell` for interior mutability since cuppa is single-threaded, so
/// the `ContentApi` trait can take `&self` like the HTTP client does.
#[derive(Default)]
pub struct MemContentApi {
    files: RefCell<HashMap<String, RemoteContent>>,
    commits: RefCell<Vec<String>>,
    next_sha: Cell<u64>,
    simulate_write_error: Cell<bool>,
}

impl MemContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Replace a file directly, as another client pushing would.
    pub fn push_external(&self, path: &str, content: &str) -> Revision {
        let revision = self.mint_revision();
        self.files.borrow_mut().insert(
            path.to_string(),
            RemoteContent {
                content: content.as_bytes().to_vec(),
                revision: revision.clone(),
            },
        );
        revision
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(path)
            .map(|f| String::from_utf8_lossy(&f.content).into_owned())
    }

    /// Messages of every accepted write, oldest first.
    pub fn commit_messages(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    fn mint_revision(&self) -> Revision {
        let n = self.next_sha.get() + 1;
        self.next_sha.set(n);
        Revision::new(format!("sha-{:04}", n))
    }
}

impl ContentApi for MemContentApi {
    fn get_content(&self, path: &str) -> Result<Option<RemoteContent>> {
        Ok(self.files.borrow().get(path).cloned())
    }

    fn put_content(
        &self,
        path: &str,
        content: &[u8],
        revision: Option<&Revision>,
        message: &str,
    ) -> Result<Revision> {
        if self.simulate_write_error.get() {
            return Err(CuppaError::Remote("Simulated write error".to_string()));
        }

        let current = self.files.borrow().get(path).map(|f| f.revision.clone());
        if current.as_ref() != revision {
            return Err(CuppaError::Conflict(format!(
                "{} does not match current revision",
                path
            )));
        }

        let new_revision = self.mint_revision();
        self.files.borrow_mut().insert(
            path.to_string(),
            RemoteContent {
                content: content.to_vec(),
                revision: new_revision.clone(),
            },
        );
        self.commits.borrow_mut().push(message.to_string());
        Ok(new_revision)
    }

    fn describe(&self, path: &str) -> String {
        format!("memory://{}", path)
    }
}
