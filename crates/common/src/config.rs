use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ledger constants
pub mod ledger {
    /// Default proof-of-work difficulty (leading zero hex digits)
    pub const DEFAULT_DIFFICULTY: u8 = 2;

    /// Hardest difficulty the configuration accepts. The expected mining cost
    /// grows as 16^difficulty, so anything beyond this is unusable on one
    /// machine.
    pub const MAX_DIFFICULTY: u8 = 8;

    /// Default path of the persisted chain document
    pub const DEFAULT_CHAIN_PATH: &str = "votechain.json";
}

/// Ledger configuration
///
/// `difficulty` is fixed for the lifetime of a chain: changing it for an
/// existing chain document would require re-mining every block, which has no
/// supported migration path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Proof-of-work difficulty in leading zero hex digits
    pub difficulty: u8,

    /// Path of the JSON chain document
    pub chain_path: PathBuf,

    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: ledger::DEFAULT_DIFFICULTY,
            chain_path: PathBuf::from(ledger::DEFAULT_CHAIN_PATH),
            verbose: false,
        }
    }
}

impl LedgerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_difficulty(mut self, difficulty: u8) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_chain_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chain_path = path.into();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty > ledger::MAX_DIFFICULTY {
            return Err(ConfigError::DifficultyOutOfRange {
                difficulty: self.difficulty,
                max: ledger::MAX_DIFFICULTY,
            });
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Failed to serialize config: {0}")]
    SerializeError(String),

    #[error("Failed to write config file: {0}")]
    WriteError(String),

    #[error("Difficulty {difficulty} exceeds the supported maximum of {max}")]
    DifficultyOutOfRange { difficulty: u8, max: u8 },
}
