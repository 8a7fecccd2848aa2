use crate::error::Result;
use crate::model::Revision;

/// A stored file together with the revision that authorizes replacing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteContent {
    pub content: Vec<u8>,
    pub revision: Revision,
}

/// Abstract interface to a hosted file-content API.
///
/// This trait handles the "how" of remote I/O (HTTP vs memory), while
/// `RemoteSnapshotStore` handles the "what" (JSON snapshots, commit messages).
pub trait ContentApi {
    /// Fetch a file. Returns `Ok(None)` when it does not exist.
    fn get_content(&self, path: &str) -> Result<Option<RemoteContent>>;

    /// Create or replace a file.
    ///
    /// `revision` must be the token of the version being replaced (`None` for a
    /// new file). A stale or missing token is rejected with
    /// `CuppaError::Conflict`. Returns the revision of the new content.
    fn put_content(
        &self,
        path: &str,
        content: &[u8],
        revision: Option<&Revision>,
        message: &str,
    ) -> Result<Revision>;

    /// Human readable location of `path`, used in messages.
    fn describe(&self, path: &str) -> String;
}
