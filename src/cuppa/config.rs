use crate::codec::Dialect;
use crate::error::{CuppaError, Result};
use crate::store::github::{RemoteConfig, DEFAULT_API_URL};
use crate::store::remote::DEFAULT_REMOTE_PATH;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_CSV_FILE: &str = "coffee-expenses.csv";
const DEFAULT_CURRENCY: &str = "NPR";

/// Keys accepted by `cuppa config`, in display order.
pub const CONFIG_KEYS: [&str; 9] = [
    "backend",
    "csv-file",
    "csv-dialect",
    "currency",
    "github.owner",
    "github.repo",
    "github.path",
    "github.branch",
    "github.api-url",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Csv,
    Github,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Csv => "csv",
            BackendKind::Github => "github",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CuppaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(BackendKind::Csv),
            "github" | "remote" => Ok(BackendKind::Github),
            other => Err(CuppaError::Config(format!(
                "Unknown backend '{}' (expected csv or github)",
                other
            ))),
        }
    }
}

/// Remote repository settings. The credential is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default = "default_remote_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            path: default_remote_path(),
            branch: None,
            api_url: default_api_url(),
        }
    }
}

/// Configuration for cuppa, stored as `config.json` in the data directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CuppaConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// CSV store path; relative paths resolve against the data directory.
    #[serde(default = "default_csv_file")]
    pub csv_file: String,

    #[serde(default)]
    pub csv_dialect: Dialect,

    /// Label shown next to prices. No conversion is ever done.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub github: GitHubSettings,
}

fn default_csv_file() -> String {
    DEFAULT_CSV_FILE.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_remote_path() -> String {
    DEFAULT_REMOTE_PATH.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for CuppaConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            csv_file: default_csv_file(),
            csv_dialect: Dialect::default(),
            currency: default_currency(),
            github: GitHubSettings::default(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl CuppaConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(CuppaError::Io)?;
        let config: CuppaConfig =
            serde_json::from_str(&content).map_err(CuppaError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(CuppaError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(CuppaError::Serialization)?;
        fs::write(config_path, content).map_err(CuppaError::Io)?;
        Ok(())
    }

    /// Display value of a key. Unset optional keys read as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "backend" => self.backend.to_string(),
            "csv-file" => self.csv_file.clone(),
            "csv-dialect" => self.csv_dialect.to_string(),
            "currency" => self.currency.clone(),
            "github.owner" => self.github.owner.clone().unwrap_or_default(),
            "github.repo" => self.github.repo.clone().unwrap_or_default(),
            "github.path" => self.github.path.clone(),
            "github.branch" => self.github.branch.clone().unwrap_or_default(),
            "github.api-url" => self.github.api_url.clone(),
            _ => return None,
        };
        Some(value)
    }

    /// Set a key from its text form. An empty value clears optional keys.
    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "backend" => self.backend = value.parse().map_err(|e: CuppaError| e.to_string())?,
            "csv-dialect" => {
                self.csv_dialect = value.parse().map_err(|e: CuppaError| e.to_string())?
            }
            "csv-file" => {
                self.csv_file = non_empty(value).ok_or("csv-file cannot be empty")?;
            }
            "currency" => {
                self.currency = non_empty(value).ok_or("currency cannot be empty")?;
            }
            "github.owner" => self.github.owner = non_empty(value),
            "github.repo" => self.github.repo = non_empty(value),
            "github.branch" => self.github.branch = non_empty(value),
            "github.path" => {
                self.github.path = non_empty(value)
                    .map(|p| p.trim_start_matches('/').to_string())
                    .ok_or("github.path cannot be empty")?;
            }
            "github.api-url" => {
                self.github.api_url = non_empty(value).ok_or("github.api-url cannot be empty")?;
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// All keys with their current values, in display order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        CONFIG_KEYS
            .iter()
            .map(|key| (*key, self.get(key).unwrap_or_default()))
            .collect()
    }

    /// Overlay environment overrides (`GITHUB_OWNER`, `GITHUB_REPO`,
    /// `CUPPA_BACKEND`). `lookup` stands in for `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(owner) = lookup("GITHUB_OWNER").as_deref().and_then(non_empty) {
            self.github.owner = Some(owner);
        }
        if let Some(repo) = lookup("GITHUB_REPO").as_deref().and_then(non_empty) {
            self.github.repo = Some(repo);
        }
        if let Some(backend) = lookup("CUPPA_BACKEND").as_deref().and_then(non_empty) {
            self.backend = backend.parse()?;
        }
        Ok(())
    }

    /// Path of the CSV store for a data directory.
    pub fn csv_path(&self, data_dir: &Path) -> PathBuf {
        let file = Path::new(&self.csv_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }

    /// Remote client settings, with the credential supplied by the caller.
    pub fn remote_config(&self, credential: Option<String>) -> Result<RemoteConfig> {
        let (Some(owner), Some(repo)) = (&self.github.owner, &self.github.repo) else {
            return Err(CuppaError::Config(
                "GitHub backend needs github.owner and github.repo (or GITHUB_OWNER and GITHUB_REPO)"
                    .to_string(),
            ));
        };

        let mut remote = RemoteConfig::new(owner.as_str(), repo.as_str(), self.github.path.as_str())
            .with_api_url(self.github.api_url.as_str());
        if let Some(branch) = &self.github.branch {
            remote = remote.with_branch(branch.as_str());
        }
        if let Some(token) = credential.as_deref().and_then(non_empty) {
            remote = remote.with_credential(token);
        }
        Ok(remote)
    }
}
