//! CLI configuration
//!
//! Loaded from TOML, then overridden by `CARDBOOK_*` environment variables.
//! A missing file yields defaults; the owner stays unset until `init`.

use crate::error::CliError;
use cardbook_core::PrincipalId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = ".cardbook/config.toml";
/// Default journal location, relative to the working directory
pub const DEFAULT_JOURNAL_PATH: &str = ".cardbook/journal.jsonl";
/// Default wait for the journal lock
pub const DEFAULT_LOCK_WAIT_MS: u64 = 2_000;

const ENV_PREFIX: &str = "CARDBOOK_";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings for the `cardbook` binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Principal that owns the ledger
    pub owner: Option<PrincipalId>,
    /// JSON Lines journal file
    pub journal_path: PathBuf,
    /// Default tracing level
    pub log_level: String,
    /// How long a mutation waits for another writer to release the journal
    pub lock_wait_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            owner: None,
            journal_path: PathBuf::from(DEFAULT_JOURNAL_PATH),
            log_level: "info".to_string(),
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
        }
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults when absent
    ///
    /// # Errors
    ///
    /// [`CliError::FileSystem`] if the file exists but cannot be read,
    /// [`CliError::Configuration`] if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }

        let config_str = std::fs::read_to_string(path).map_err(|e| {
            CliError::FileSystem(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        toml::from_str(&config_str).map_err(|e| {
            CliError::Configuration(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Resolve the config path: the explicit one if it exists, else the
    /// home-directory fallback if that exists, else the explicit one.
    pub fn resolve_path(explicit: &Path) -> PathBuf {
        if explicit.exists() {
            return explicit.to_path_buf();
        }
        dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_PATH))
            .filter(|fallback| fallback.exists())
            .unwrap_or_else(|| explicit.to_path_buf())
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// [`CliError::Serialization`] or [`CliError::FileSystem`].
    pub fn save(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::FileSystem(format!("Failed to create config directory: {e}"))
            })?;
        }

        let config_str = toml::to_string_pretty(self)
            .map_err(|e| CliError::Serialization(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, config_str)
            .map_err(|e| CliError::FileSystem(format!("Failed to write config file: {e}")))
    }

    /// Apply `CARDBOOK_OWNER`, `CARDBOOK_JOURNAL` and `CARDBOOK_LOG`
    ///
    /// # Errors
    ///
    /// [`CliError::Configuration`] for an unparsable owner.
    pub fn merge_with_env(&mut self) -> Result<(), CliError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from arbitrary `(key, value)` pairs
    ///
    /// # Errors
    ///
    /// [`CliError::Configuration`] for an unparsable owner.
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), CliError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "OWNER" => {
                    let owner = value.parse().map_err(|e| {
                        CliError::Configuration(format!("Invalid {key} '{value}': {e}"))
                    })?;
                    self.owner = Some(owner);
                }
                "JOURNAL" => self.journal_path = PathBuf::from(value),
                "LOG" => self.log_level = value.to_lowercase(),
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// [`CliError::Configuration`] for an empty journal path or unknown log level.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.journal_path.as_os_str().is_empty() {
            return Err(CliError::Configuration(
                "journal_path must not be empty".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CliError::Configuration(format!(
                "log_level '{}' is not one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// The configured owner, required for mutations
    ///
    /// # Errors
    ///
    /// [`CliError::MissingOwner`] when unset.
    pub fn require_owner(&self) -> Result<PrincipalId, CliError> {
        self.owner.ok_or(CliError::MissingOwner)
    }
}
