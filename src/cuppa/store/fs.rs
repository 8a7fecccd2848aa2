use super::ExpenseStore;
use crate::codec::{self, Dialect};
use crate::error::{CuppaError, Result};
use crate::model::{Expense, Revision, Snapshot};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Expenses persisted as one CSV file.
///
/// The file is the single source of truth and is rewritten in full on every
/// mutation (temp file + rename, so readers never see a partial write).
pub struct CsvFileStore {
    path: PathBuf,
    dialect: Dialect,
}

impl CsvFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dialect: Dialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Decoded records, creating the store first if needed.
    pub fn list(&self) -> Result<Vec<Expense>> {
        Ok(self.load_snapshot()?.records)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.as_os_str().is_empty() && !path.exists() {
            fs::create_dir_all(path).map_err(CuppaError::Io)?;
        }
        Ok(())
    }

    fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Current file bytes, or `None` when the file does not exist.
    fn read_current(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CuppaError::Io(e)),
        }
    }

    fn write_atomic(&self, content: &str) -> Result<Revision> {
        let dir = self.parent_dir();
        self.ensure_dir(dir)?;

        let tmp = dir.join(format!(".cuppa-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, content).map_err(CuppaError::Io)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(CuppaError::Io(e));
        }
        Ok(content_revision(content.as_bytes()))
    }
}

/// Revision token of a CSV file: hex SHA-256 of its bytes.
pub fn content_revision(bytes: &[u8]) -> Revision {
    Revision::new(hex::encode(Sha256::digest(bytes)))
}

impl ExpenseStore for CsvFileStore {
    fn load_snapshot(&self) -> Result<Snapshot> {
        self.ensure_store()?;
        let bytes = self.read_current()?.unwrap_or_default();
        let text = String::from_utf8(bytes)
            .map_err(|e| CuppaError::Parse(format!("{} is not UTF-8: {}", self.location(), e)))?;

        let records = codec::decode(&text, self.dialect);
        debug!(path = %self.path.display(), count = records.len(), "loaded csv store");
        Ok(Snapshot::new(
            records,
            Some(content_revision(text.as_bytes())),
        ))
    }

    fn commit(&mut self, base: &Snapshot, next: &[Expense]) -> Result<Revision> {
        let current = self.read_current()?.map(|bytes| content_revision(&bytes));
        if current != base.revision {
            warn!(
                path = %self.path.display(),
                expected = ?base.revision,
                found = ?current,
                "csv store changed since it was read"
            );
            return Err(CuppaError::Conflict(format!(
                "{} was modified by another writer",
                self.location()
            )));
        }

        let revision = self.write_atomic(&codec::encode(next, self.dialect))?;
        info!(path = %self.path.display(), count = next.len(), "wrote csv store");
        Ok(revision)
    }

    fn save(&mut self, records: &[Expense]) -> Result<Revision> {
        self.write_atomic(&codec::encode(records, self.dialect))
    }

    /// Creates the file with only the header row when it is absent.
    fn ensure_store(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.ensure_dir(self.parent_dir())?;
        fs::write(&self.path, codec::header_line()).map_err(CuppaError::Io)?;
        debug!(path = %self.path.display(), "created csv store");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExpenseDraft;
    use tempfile::TempDir;

    fn setup() -> (TempDir, CsvFileStore) {
        let dir = TempDir::new().unwrap();
        let store = CsvFileStore::new(dir.path().join("data").join("coffee-expenses.csv"));
        (dir, store)
    }

    fn latte() -> Expense {
        Expense::with_id("a1", ExpenseDraft::new("Latte", "Cafe A", "150", "2024-01-01"))
    }

    #[test]
    fn ensure_store_creates_header_only_file() {
        let (_dir, store) = setup();
        store.ensure_store().unwrap();
        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert_eq!(on_disk, "id,type,location,price,date,notes\n");
    }

    #[test]
    fn ensure_store_is_idempotent() {
        let (_dir, mut store) = setup();
        store.ensure_store().unwrap();
        store.save(&[latte()]).unwrap();
        store.ensure_store().unwrap();
        assert_eq!(store.list().unwrap(), vec![latte()]);
    }

    #[test]
    fn fresh_store_lists_empty() {
        let (_dir, store) = setup();
        assert!(store.list().unwrap().is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn revision_tracks_file_content() {
        let (_dir, mut store) = setup();
        let before = store.load_snapshot().unwrap().revision;
        store.save(&[latte()]).unwrap();
        let after = store.load_snapshot().unwrap().revision;
        assert_ne!(before, after);
        assert_eq!(
            after,
            Some(content_revision(&fs::read(store.path()).unwrap()))
        );
    }

    #[test]
    fn commit_returns_revision_of_written_bytes() {
        let (_dir, mut store) = setup();
        let base = store.load_snapshot().unwrap();
        let rev = store.commit(&base, &[latte()]).unwrap();
        assert_eq!(store.load_snapshot().unwrap().revision, Some(rev));
    }

    #[test]
    fn commit_rejects_stale_snapshot() {
        let (_dir, mut store) = setup();
        let stale = store.load_snapshot().unwrap();

        // Another writer lands first.
        let fresh = store.load_snapshot().unwrap();
        store.commit(&fresh, &[latte()]).unwrap();

        let err = store.commit(&stale, &[]).unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.list().unwrap(), vec![latte()]);
    }

    #[test]
    fn commit_detects_file_removed_after_load() {
        let (_dir, mut store) = setup();
        let base = store.load_snapshot().unwrap();
        fs::remove_file(store.path()).unwrap();
        assert!(store.commit(&base, &[latte()]).unwrap_err().is_conflict());
    }

    #[test]
    fn read_failure_is_an_error_not_empty() {
        let (dir, _) = setup();
        let as_dir = dir.path().join("actually-a-dir.csv");
        fs::create_dir_all(&as_dir).unwrap();
        let store = CsvFileStore::new(&as_dir);
        assert!(matches!(store.load_snapshot(), Err(CuppaError::Io(_))));
    }

    #[test]
    fn legacy_dialect_writes_unescaped_quotes() {
        let (_dir, mut store) = setup();
        store = store.with_dialect(Dialect::Legacy);
        let mut e = latte();
        e.notes = "say \"hi\"".into();
        store.save(&[e]).unwrap();
        let on_disk = fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains(",say \"hi\"\n"));
    }
}
