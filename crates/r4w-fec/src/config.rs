//! # Codec Configuration
//!
//! YAML configuration for the Reed-Solomon code and the Viterbi decoder.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `R4W_FEC_CONFIG` environment variable
//! 2. `./r4w-fec.yaml` (current directory)
//! 3. `~/.config/r4w/fec.yaml` (user config)
//! 4. `/etc/r4w/fec.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! reed_solomon:
//!   symsize: 8
//!   gfpoly: 0x187
//!   fcr: 112
//!   prim: 11
//!   nroots: 32
//!   pad: 0
//!
//! viterbi:
//!   polynomials: [0x1ed, 0x19b, 0x127]
//!   max_frame_bits: 2048
//!   backend: auto
//!
//! logging:
//!   level: debug
//!   format: compact
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::observe::LogConfig;
use crate::reed_solomon::{RsCode, RsParams};
use crate::types::FecError;
use crate::viterbi::{Backend, BranchTable, Polynomials, Viterbi39, SYMBOLS_PER_STEP};

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "R4W_FEC_CONFIG";

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {0}")]
    NotFound(String),

    #[error("failed to read config: {0}")]
    ReadError(String),

    #[error("failed to parse config: {0}")]
    ParseError(String),

    #[error("invalid config: {0}")]
    ValidationError(String),

    #[error("codec rejected config: {0}")]
    Codec(#[from] FecError),
}

/// Viterbi decoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViterbiConfig {
    /// Generator polynomials; a negative value inverts that output
    pub polynomials: [i32; SYMBOLS_PER_STEP],
    /// Longest frame, in data bits, a decoder is sized for
    pub max_frame_bits: usize,
    /// ACS kernel selection
    pub backend: Backend,
}

impl Default for ViterbiConfig {
    fn default() -> Self {
        Self {
            polynomials: Polynomials::STANDARD,
            max_frame_bits: 2048,
            backend: Backend::Auto,
        }
    }
}

/// Complete codec configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FecConfig {
    pub reed_solomon: RsParams,
    pub viterbi: ViterbiConfig,
    pub logging: LogConfig,
}

impl FecConfig {
    /// Load configuration from the default search path.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!(path = %path, "{} points to a missing file", CONFIG_ENV);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded FEC config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./r4w-fec.yaml")];

        if let Some(dirs) = directories::ProjectDirs::from("", "", "r4w") {
            paths.push(dirs.config_dir().join("fec.yaml"));
        }

        paths.push(PathBuf::from("/etc/r4w/fec.yaml"));
        paths
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.viterbi.max_frame_bits == 0 {
            return Err(ConfigError::ValidationError(
                "max_frame_bits must be > 0".to_string(),
            ));
        }
        for &poly in &self.viterbi.polynomials {
            Polynomials::validate(poly)?;
        }

        // Building the code runs the full parameter checks
        RsCode::new(self.reed_solomon)?;
        Ok(())
    }

    /// Build the configured Reed-Solomon code.
    pub fn build_rs(&self) -> Result<RsCode, ConfigError> {
        Ok(RsCode::new(self.reed_solomon)?)
    }

    /// Build a decoder with the configured polynomials and backend.
    pub fn build_decoder(&self) -> Result<Viterbi39, ConfigError> {
        let table = if self.viterbi.polynomials == Polynomials::STANDARD {
            BranchTable::standard()
        } else {
            Arc::new(BranchTable::new(self.viterbi.polynomials)?)
        };
        Ok(Viterbi39::with_table(
            self.viterbi.max_frame_bits,
            table,
            self.viterbi.backend,
        )?)
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::LogLevel;

    #[test]
    fn test_default_config() {
        let config = FecConfig::default();
        assert_eq!(config.reed_solomon, RsParams::ccsds());
        assert_eq!(config.viterbi.polynomials, [0x1ed, 0x19b, 0x127]);
        assert_eq!(config.viterbi.backend, Backend::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
reed_solomon:
  symsize: 8
  gfpoly: 0x11d
  fcr: 0
  prim: 1
  nroots: 16
  pad: 100

viterbi:
  polynomials: [0x1ed, -411, 0x127]
  max_frame_bits: 4096
  backend: scalar

logging:
  level: trace
"#;

        let config = FecConfig::parse(yaml).unwrap();
        assert_eq!(config.reed_solomon, RsParams::dvb().with_pad(100));
        assert_eq!(config.viterbi.polynomials, [0x1ed, -0x19b, 0x127]);
        assert_eq!(config.viterbi.max_frame_bits, 4096);
        assert_eq!(config.viterbi.backend, Backend::Scalar);
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert!(config.validate().is_ok());

        let rs = config.build_rs().unwrap();
        assert_eq!(rs.data_len(), 255 - 16 - 100);
        let decoder = config.build_decoder().unwrap();
        assert_eq!(decoder.backend(), Backend::Scalar);
        assert_eq!(decoder.table().polynomials(), [0x1ed, -0x19b, 0x127]);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
viterbi:
  max_frame_bits: 128
"#;

        let config = FecConfig::parse(yaml).unwrap();
        assert_eq!(config.viterbi.max_frame_bits, 128);
        // Defaults should be applied
        assert_eq!(config.viterbi.polynomials, Polynomials::STANDARD);
        assert_eq!(config.reed_solomon, RsParams::ccsds());
    }

    #[test]
    fn test_parse_error() {
        let err = FecConfig::parse("viterbi: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        let err = FecConfig::parse("viterbi:\n  backend: avx512\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation() {
        let mut config = FecConfig::default();
        config.viterbi.max_frame_bits = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        config.viterbi.max_frame_bits = 64;
        config.viterbi.polynomials[2] = 0x27;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Codec(FecError::InvalidPolynomial(0x27)))
        );

        config.viterbi.polynomials = Polynomials::STANDARD;
        config.reed_solomon.pad = 223;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Codec(FecError::PadTooLarge { .. }))
        ));
        assert!(config.build_rs().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fec.yaml");

        let mut config = FecConfig::default();
        config.reed_solomon.pad = 33;
        config.viterbi.backend = Backend::Lanes;
        config.save(&path).unwrap();

        let loaded = FecConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FecConfig::load_from(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_example_yaml() {
        let yaml = FecConfig::example_yaml();
        assert!(yaml.contains("reed_solomon:"));
        assert!(yaml.contains("viterbi:"));
        assert_eq!(FecConfig::parse(&yaml).unwrap(), FecConfig::default());
    }

    #[test]
    fn test_config_search_paths() {
        let paths = FecConfig::config_search_paths();
        assert!(paths[0].ends_with("r4w-fec.yaml"));
        assert!(paths.last().map_or(false, |p| p.ends_with("fec.yaml")));
    }
}
