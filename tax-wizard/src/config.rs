//! TOML configuration for the wizard.
//!
//! Every field is optional. A missing file is not an error when no path was
//! given explicitly; see [`WizardConfig::load_or_default`].

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tax_core::{EstimatorConfig, EstimatorConfigError};
use thiserror::Error;

use crate::tasks::TaskDelays;

pub const DEFAULT_CONFIG_FILE: &str = "tax-wizard.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid estimator settings: {0}")]
    Estimator(#[from] EstimatorConfigError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` wins when set.
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// Year printed in the summary file name.
    pub tax_year: i32,
    pub output_dir: PathBuf,
    pub document_delay_ms: u64,
    pub verification_delay_ms: u64,
    pub submission_delay_ms: u64,
    pub estimator: EstimatorConfig,
    pub logging: LoggingConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        let delays = TaskDelays::default();
        Self {
            tax_year: 2024,
            output_dir: PathBuf::from("."),
            document_delay_ms: delays.document.as_millis() as u64,
            verification_delay_ms: delays.verification.as_millis() as u64,
            submission_delay_ms: delays.submission.as_millis() as u64,
            estimator: EstimatorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WizardConfig {
    pub fn parse(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.estimator.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Loads `path` when given; otherwise loads [`DEFAULT_CONFIG_FILE`] if it
    /// exists in the working directory, falling back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn task_delays(&self) -> TaskDelays {
        TaskDelays {
            document: Duration::from_millis(self.document_delay_ms),
            verification: Duration::from_millis(self.verification_delay_ms),
            submission: Duration::from_millis(self.submission_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn parse(text: &str) -> Result<WizardConfig, ConfigError> {
        WizardConfig::parse(text, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").unwrap(), WizardConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = parse(
            r#"
            tax_year = 2025
            submission_delay_ms = 10

            [estimator]
            state_rate = "0.04"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.tax_year, 2025);
        assert_eq!(config.task_delays().submission, Duration::from_millis(10));
        assert_eq!(config.task_delays().document, Duration::from_millis(2000));
        assert_eq!(config.estimator.state_rate, dec!(0.04));
        assert_eq!(config.estimator.standard_deduction, dec!(13850));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn invalid_estimator_settings_are_rejected() {
        let result = parse(
            r#"
            [estimator]
            brackets = []
            "#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::Estimator(EstimatorConfigError::NoTaxBrackets))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(parse("tax_year = "), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let result = WizardConfig::load(Path::new("/this/path/does/not/exist.toml"));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
