//! Configuration for the ledger

use crate::types::{Category, FlagVocabulary};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the beneficiary CSV file
    pub store_path: PathBuf,

    /// Column headers of the persisted table
    pub columns: ColumnNames,

    /// Persisted spelling of flag values
    pub flags: FlagVocabulary,

    /// Writer configuration
    pub writer: WriterConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data/beneficiaries.csv"),
            columns: ColumnNames::default(),
            flags: FlagVocabulary::default(),
            writer: WriterConfig::default(),
        }
    }
}

/// Header names of the required columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Ticket code
    pub ticket_code: String,
    /// Beneficiary name
    pub name: String,
    /// Age
    pub age: String,
    /// Partner
    pub partner: String,
    /// Card
    pub card: String,
    /// Token flag
    pub token_distributed: String,
    /// NFI flag
    pub nfi: String,
    /// Tools flag
    pub tools: String,
    /// Seed flag
    pub seed: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            ticket_code: "Ticket Code".to_string(),
            name: "Name".to_string(),
            age: "Age".to_string(),
            partner: "Parténaire".to_string(),
            card: "Carte".to_string(),
            token_distributed: "Jeton Distribué".to_string(),
            nfi: "NFI".to_string(),
            tools: "Outils".to_string(),
            seed: "Semence".to_string(),
        }
    }
}

impl ColumnNames {
    /// Header of a flag column
    pub fn flag(&self, category: Category) -> &str {
        match category {
            Category::Token => &self.token_distributed,
            Category::Nfi => &self.nfi,
            Category::Tools => &self.tools,
            Category::Seed => &self.seed,
        }
    }
}

/// Single-writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Mailbox capacity (pending write commands)
    pub mailbox_capacity: usize,

    /// Max time a write may wait for the writer (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 256,
            write_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::Error::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(path) = std::env::var("LEDGER_STORE_PATH") {
            self.store_path = PathBuf::from(path);
        }

        if let Ok(timeout) = std::env::var("LEDGER_WRITE_TIMEOUT_MS") {
            self.writer.write_timeout_ms = timeout.parse().map_err(|_| {
                crate::Error::Config(format!("LEDGER_WRITE_TIMEOUT_MS is not a number: {}", timeout))
            })?;
        }

        if let Ok(capacity) = std::env::var("LEDGER_MAILBOX_CAPACITY") {
            self.writer.mailbox_capacity = capacity.parse().map_err(|_| {
                crate::Error::Config(format!("LEDGER_MAILBOX_CAPACITY is not a number: {}", capacity))
            })?;
        }

        self.validate()
    }

    /// Reject settings the writer cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.writer.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "writer.mailbox_capacity must be positive".to_string(),
            ));
        }
        if self.flags.done.trim().is_empty()
            || self.flags.done.trim().eq_ignore_ascii_case(self.flags.pending.trim())
        {
            return Err(crate::Error::Config(
                "flag literals must be non-empty and distinct".to_string(),
            ));
        }
        Ok(())
    }
}
