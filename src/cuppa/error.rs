use thiserror::Error;

#[derive(Error, Debug)]
pub enum CuppaError {
    #[error("Expense not found: {0}")]
    NotFound(String),

    #[error("Expense id already exists: {0}")]
    DuplicateId(String),

    #[error("Id prefix '{0}' matches more than one expense")]
    AmbiguousId(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// The backing record set changed since it was loaded.
    #[error("Revision conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote API error: {0}")]
    Remote(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl CuppaError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CuppaError::Conflict(_))
    }
}

pub type Result<T> = std::result::Result<T, CuppaError>;
