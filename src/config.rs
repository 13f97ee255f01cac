//! Configuration loader and validator for the bulk import pipeline.
//!
//! Reference data the validators and writer need (fallback home segments,
//! the Indian state allow-list, the row cap) is carried here and passed in
//! explicitly, so the pipeline stays testable without a live store.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub app: App,
    pub import: Import,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

/// Import limits and reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// Hard cap on rows per uploaded file.
    pub max_rows: usize,
    /// Known home-page segment keys used when the store has none (or is
    /// unreachable) while building the opportunity validation context.
    pub fallback_segments: Vec<String>,
    /// Indian states and union territories accepted for a school's `state`.
    pub indian_states: Vec<String>,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.import.max_rows == 0 {
        return Err(ConfigError::Invalid("import.max_rows must be > 0"));
    }
    if cfg.import.fallback_segments.is_empty() {
        return Err(ConfigError::Invalid(
            "import.fallback_segments must list at least one segment key",
        ));
    }
    if cfg
        .import
        .fallback_segments
        .iter()
        .any(|s| s.trim().is_empty())
    {
        return Err(ConfigError::Invalid(
            "import.fallback_segments entries must be non-empty",
        ));
    }
    if cfg.import.indian_states.is_empty() {
        return Err(ConfigError::Invalid(
            "import.indian_states must list at least one state",
        ));
    }
    Ok(())
}

/// Returns the example YAML shipped with the tool.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

import:
  max_rows: 500
  fallback_segments:
    - "featured"
    - "scholarships"
    - "olympiads"
    - "trending"
    - "closing-soon"
  indian_states:
    - "Andhra Pradesh"
    - "Arunachal Pradesh"
    - "Assam"
    - "Bihar"
    - "Chhattisgarh"
    - "Goa"
    - "Gujarat"
    - "Haryana"
    - "Himachal Pradesh"
    - "Jharkhand"
    - "Karnataka"
    - "Kerala"
    - "Madhya Pradesh"
    - "Maharashtra"
    - "Manipur"
    - "Meghalaya"
    - "Mizoram"
    - "Nagaland"
    - "Odisha"
    - "Punjab"
    - "Rajasthan"
    - "Sikkim"
    - "Tamil Nadu"
    - "Telangana"
    - "Tripura"
    - "Uttar Pradesh"
    - "Uttarakhand"
    - "West Bengal"
    - "Andaman and Nicobar Islands"
    - "Chandigarh"
    - "Dadra and Nagar Haveli and Daman and Diu"
    - "Lakshadweep"
    - "Delhi"
    - "Puducherry"
"#
}
