//! Configuration for ticket sheets

use crate::error::{Result, SheetError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sheet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Output PDF path
    pub output_path: PathBuf,

    /// Document title (PDF metadata)
    pub title: String,

    /// Organisation logo drawn at the top of each ticket
    pub logo_path: Option<PathBuf>,

    /// Text drawn in place of the logo when none is configured
    pub mark_text: String,

    /// Caption at the bottom-left of each ticket
    pub caption: String,

    /// Grid columns per page
    pub columns: usize,

    /// Grid rows per page
    pub rows: usize,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("tickets.pdf"),
            title: "Beneficiary tickets".to_string(),
            logo_path: None,
            mark_text: "AID".to_string(),
            caption: "Q1-2025".to_string(),
            columns: 4,
            rows: 4,
        }
    }
}

impl SheetConfig {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SheetConfig = toml::from_str(&content)
            .map_err(|e| SheetError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = SheetConfig::default();

        if let Ok(path) = std::env::var("SHEETS_OUTPUT") {
            config.output_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("SHEETS_LOGO") {
            config.logo_path = Some(PathBuf::from(path));
        }

        if let Ok(caption) = std::env::var("SHEETS_CAPTION") {
            config.caption = caption;
        }

        config.validate()?;
        Ok(config)
    }

    /// Grid must hold at least one cell
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 || self.rows == 0 {
            return Err(SheetError::Config(format!(
                "grid must have at least one cell, got {}x{}",
                self.columns, self.rows
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SheetConfig::default();
        assert_eq!(config.columns * config.rows, 16);
        assert_eq!(config.caption, "Q1-2025");
        assert!(config.logo_path.is_none());
    }

    #[test]
    fn test_zero_grid_rejected() {
        let config = SheetConfig {
            columns: 0,
            ..SheetConfig::default()
        };
        assert!(matches!(config.validate(), Err(SheetError::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheets.toml");
        std::fs::write(&path, "caption = \"Q3-2025\"\ncolumns = 3\n").unwrap();

        let config = SheetConfig::from_file(&path).unwrap();
        assert_eq!(config.caption, "Q3-2025");
        assert_eq!(config.columns, 3);
        assert_eq!(config.rows, 4);
    }
}
