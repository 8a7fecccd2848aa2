use crate::config::CuppaConfig;
use crate::model::Expense;
use std::path::PathBuf;

pub mod add;
pub mod config;
pub mod delete;
pub mod export;
pub mod helpers;
pub mod import;
pub mod init;
pub mod list;
pub mod summary;
pub mod update;
pub mod view;

pub use summary::Summary;

#[derive(Debug, Clone)]
pub struct CuppaPaths {
    /// Holds `config.json` and, by default, the CSV store.
    pub data_dir: PathBuf,
}

impl CuppaPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub affected_expenses: Vec<Expense>,
    pub listed_expenses: Vec<Expense>,
    pub summary: Option<Summary>,
    pub exported_path: Option<PathBuf>,
    /// Encoded CSV, when an export targets stdout.
    pub csv: Option<String>,
    pub config: Option<CuppaConfig>,
    pub messages: Vec<CmdMessage>,
    /// The listing is empty because the store could not be read.
    pub load_failed: bool,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_expenses(mut self, expenses: Vec<Expense>) -> Self {
        self.affected_expenses = expenses;
        self
    }

    pub fn with_listed_expenses(mut self, expenses: Vec<Expense>) -> Self {
        self.listed_expenses = expenses;
        self
    }

    pub fn with_summary(mut self, summary: Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    pub fn with_config(mut self, config: CuppaConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Error)
    }
}
