use crate::commands::{CmdMessage, CmdResult, CuppaPaths};
use crate::config::CuppaConfig;
use crate::error::Result;
use crate::store::ExpenseStore;
use std::fs;

/// Creates the data directory, a default `config.json` if none exists, and
/// the backing store.
pub fn run<S: ExpenseStore>(paths: &CuppaPaths, store: &S) -> Result<CmdResult> {
    fs::create_dir_all(&paths.data_dir)?;

    let mut result = CmdResult::default();
    if !paths.data_dir.join("config.json").exists() {
        CuppaConfig::default().save(&paths.data_dir)?;
        result.add_message(CmdMessage::info(format!(
            "Wrote default config to {}",
            paths.data_dir.join("config.json").display()
        )));
    }

    store.ensure_store()?;
    result.add_message(CmdMessage::success(format!(
        "Initialized cuppa store at {}",
        store.location()
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fs::CsvFileStore;
    use tempfile::TempDir;

    #[test]
    fn creates_config_and_store() {
        let dir = TempDir::new().unwrap();
        let paths = CuppaPaths::new(dir.path().join("cuppa"));
        let store = CsvFileStore::new(paths.data_dir.join("coffee-expenses.csv"));

        run(&paths, &store).unwrap();
        assert!(paths.data_dir.join("config.json").exists());
        assert!(store.path().exists());
    }

    #[test]
    fn keeps_existing_config() {
        let dir = TempDir::new().unwrap();
        let paths = CuppaPaths::new(dir.path());
        let mut config = CuppaConfig::default();
        config.currency = "EUR".into();
        config.save(&paths.data_dir).unwrap();

        let store = CsvFileStore::new(dir.path().join("x.csv"));
        let res = run(&paths, &store).unwrap();
        assert_eq!(res.messages.len(), 1);
        assert_eq!(CuppaConfig::load(&paths.data_dir).unwrap().currency, "EUR");
    }
}
