use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tracing::Level;

use crate::{
    constants::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT_SIZE},
    domain::entities::trust_anchor::TrustAnchor,
    errors::{EncodingError, ReceiptError},
};

/// Verifier configuration with all fields ready to use.
#[derive(Debug, Clone)]
pub struct Config {
    pub trust_anchor: Arc<TrustAnchor>,
    pub limits: DecodeLimits,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self, ReceiptError> {
        let config_path = config_path.as_ref();
        let config_string = std::fs::read_to_string(config_path)
            .map_err(|e| ReceiptError::FileIo(e, config_path.to_path_buf()))?;
        let mut config_file = ConfigFile::from_str(&config_string)?;

        // Relative anchor paths are relative to the config file, not the
        // working directory.
        if config_file.trust_anchor.is_relative() {
            if let Some(dir) = config_path.parent() {
                config_file.trust_anchor = dir.join(&config_file.trust_anchor);
            }
        }
        Self::from_config_file(config_file)
    }

    pub fn from_config_file(config: ConfigFile) -> Result<Self, ReceiptError> {
        let trust_anchor = TrustAnchor::from_file(&config.trust_anchor)?;
        Ok(Self {
            trust_anchor: Arc::new(trust_anchor),
            limits: config.limits,
            logging: config.logging,
        })
    }
}

/// Configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
#[non_exhaustive]
pub struct ConfigFile {
    /// DER or PEM encoded root certificate.
    pub trust_anchor: PathBuf,
    #[serde(default)]
    pub limits: DecodeLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FromStr for ConfigFile {
    type Err = ReceiptError;

    fn from_str(config_string: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(config_string)?)
    }
}

/// Upper bounds applied to every input before and while it is decoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "snake_case")]
pub struct DecodeLimits {
    /// Largest accepted envelope, in bytes.
    pub max_input_size: usize,
    /// Deepest accepted element nesting.
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeLimits {
    pub(crate) fn check_input(&self, input: &[u8]) -> Result<(), EncodingError> {
        if input.len() > self.max_input_size {
            return Err(EncodingError::InputTooLarge {
                size: input.len(),
                limit: self.max_input_size,
            });
        }
        Ok(())
    }
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct LoggingConfig {
    #[serde_as(as = "DisplayFromStr")]
    pub stdout_log_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout_log_level: Level::INFO,
        }
    }
}
