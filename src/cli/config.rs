//! Ballot configuration file handling
//!
//! Provides default configuration generation and loading for the `ballot`
//! binary. Configuration files are TOML and live under the user data
//! directory unless `--config` points elsewhere.

use ballot::ballot::{events::DEFAULT_CHANNEL_CAPACITY, Ballot, BallotPolicy, Identity};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotConfig {
    /// Who runs the ballot and what it asks
    pub ballot: BallotSection,

    /// Proposal cap and visibility
    #[serde(default)]
    pub policy: BallotPolicy,

    /// Notification delivery
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotSection {
    /// Identity of the initial administrator
    pub administrator: String,

    /// The single question put to the voters
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Records buffered per push subscriber before it starts lagging
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl BallotConfig {
    /// Create a new configuration with default policy
    #[cfg(test)]
    pub fn new(administrator: &str, question: &str) -> Self {
        Self {
            ballot: BallotSection {
                administrator: administrator.to_string(),
                question: question.to_string(),
            },
            policy: BallotPolicy::default(),
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: BallotConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.ballot.administrator.trim().is_empty() {
            return Err("ballot.administrator must not be empty".into());
        }
        if self.ballot.question.trim().is_empty() {
            return Err("ballot.question must not be empty".into());
        }
        self.policy.validate()?;
        Ok(())
    }

    /// Build a fresh ballot from this configuration
    pub fn build_ballot(&self) -> Result<Ballot, Box<dyn std::error::Error>> {
        let ballot = Ballot::with_channel_capacity(
            Identity::new(self.ballot.administrator.trim()),
            self.ballot.question.as_str(),
            self.policy,
            self.events.channel_capacity,
        )?;
        Ok(ballot)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(administrator: &str, question: &str) -> String {
        format!(
            r#"# Ballot Configuration
#
# The administrator registers voters, opens and closes each phase, tallies
# and breaks ties. Only registered voters submit proposals and vote.

[ballot]
# Identity of the initial administrator
administrator = {administrator}

# The single question put to the voters
question = {question}

[policy]
# Maximum number of proposals (at least 1)
proposal_cap = 1000

# Who may read proposals and voter status: "voters_only" or "public"
proposal_visibility = "voters_only"

[events]
# Records buffered per live subscriber before it starts lagging
channel_capacity = 1024

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/ballot/ballot.log"
"#,
            administrator = toml::Value::String(administrator.to_string()),
            question = toml::Value::String(question.to_string()),
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        administrator: &str,
        question: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(administrator, question);

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Get the default config file path
///
/// - Linux: ~/.local/share/ballot/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ballot")
        .join("config.toml")
}

/// Resolve `--config`, falling back to the default location
pub fn resolve_config_path(config: Option<String>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}
