//! TOML configuration for a sign-in deployment.
//!
//! # Responsibility
//! - Load roster, backend selection and policy switches from one file.
//! - Validate settings before any store is opened.
//!
//! # Invariants
//! - A loaded `Config` always carries a non-empty roster.
//! - The `sheet` backend always has a `[store.sheet]` table.

use crate::model::roster::{MemberRoster, RosterError};
use crate::service::sign_in::{RosterStrictness, SignInPolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "config is not valid TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<RosterError> for ConfigError {
    fn from(value: RosterError) -> Self {
        Self::Invalid(value.to_string())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ordered member display names.
    pub roster: Vec<String>,
    #[serde(default)]
    pub roster_strictness: RosterStrictness,
    /// Whether prayer mode is part of the uniqueness key.
    #[serde(default)]
    pub key_includes_prayer_mode: bool,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend kind selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
    Sheet,
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// File path for the `json` and `sqlite` backends.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<SheetConfig>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            sheet: None,
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("attendance.json")
}

/// Remote spreadsheet settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_sheet_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SheetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_token_env() -> String {
    "FASTSIGN_SHEET_TOKEN".to_string()
}

fn default_sheet_base_url() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Log output settings. No `dir` means logging stays off.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    crate::logging::default_log_level().to_string()
}

impl Config {
    /// Reads and validates a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.resolve_relative_paths(path.parent());
        Ok(config)
    }

    /// Parses and validates config text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.member_roster()?;

        match (self.store.backend, &self.store.sheet) {
            (StoreBackend::Sheet, None) => {
                return Err(ConfigError::Invalid(
                    "backend `sheet` requires a [store.sheet] table".to_string(),
                ));
            }
            (StoreBackend::Sheet, Some(sheet)) => {
                if sheet.spreadsheet_id.trim().is_empty() {
                    return Err(ConfigError::Invalid(
                        "store.sheet.spreadsheet_id cannot be empty".to_string(),
                    ));
                }
                if sheet.timeout_secs == 0 {
                    return Err(ConfigError::Invalid(
                        "store.sheet.timeout_secs must be positive".to_string(),
                    ));
                }
            }
            (_, _) => {
                if self.store.path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid("store.path cannot be empty".to_string()));
                }
            }
        }

        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn member_roster(&self) -> Result<MemberRoster, ConfigError> {
        Ok(MemberRoster::new(&self.roster)?)
    }

    /// Builds the sign-in policy described by this config.
    pub fn sign_in_policy(&self) -> Result<SignInPolicy, ConfigError> {
        Ok(SignInPolicy::new(self.member_roster()?)
            .with_strictness(self.roster_strictness)
            .with_prayer_mode_in_key(self.key_includes_prayer_mode))
    }

    fn resolve_relative_paths(&mut self, base: Option<&Path>) {
        if let Some(base) = base {
            if self.store.path.is_relative() {
                self.store.path = base.join(&self.store.path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, StoreBackend};
    use crate::service::sign_in::RosterStrictness;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_toml_str(r#"roster = ["Alice", "Bob"]"#).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Json);
        assert_eq!(config.roster_strictness, RosterStrictness::Strict);
        assert!(!config.key_includes_prayer_mode);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn sheet_backend_reads_nested_table_with_defaults() {
        let config = Config::from_toml_str(
            r#"
            roster = ["Alice"]
            roster_strictness = "lenient"

            [store]
            backend = "sheet"

            [store.sheet]
            spreadsheet_id = "abc"
            "#,
        )
        .unwrap();

        let sheet = config.store.sheet.as_ref().unwrap();
        assert_eq!(sheet.sheet_name, "Sheet1");
        assert_eq!(sheet.token_env, "FASTSIGN_SHEET_TOKEN");
        assert_eq!(sheet.timeout().as_secs(), 30);
        assert_eq!(config.roster_strictness, RosterStrictness::Lenient);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let empty_roster = Config::from_toml_str("roster = []").unwrap_err();
        assert!(matches!(empty_roster, ConfigError::Invalid(_)));

        let missing_sheet = Config::from_toml_str(
            r#"
            roster = ["Alice"]
            [store]
            backend = "sheet"
            "#,
        )
        .unwrap_err();
        assert!(missing_sheet.to_string().contains("[store.sheet]"));

        let unknown_backend = Config::from_toml_str(
            r#"
            roster = ["Alice"]
            [store]
            backend = "postgres"
            "#,
        )
        .unwrap_err();
        assert!(matches!(unknown_backend, ConfigError::Parse(_)));

        let relative_logs = Config::from_toml_str(
            r#"
            roster = ["Alice"]
            [logging]
            dir = "logs"
            "#,
        )
        .unwrap_err();
        assert!(relative_logs.to_string().contains("absolute"));
    }

    #[test]
    fn load_resolves_store_path_next_to_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fastsign.toml");
        std::fs::write(
            &path,
            "roster = [\"Alice\"]\n[store]\nbackend = \"sqlite\"\npath = \"log.db\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
        assert_eq!(config.store.path, dir.path().join("log.db"));
    }
}
