//! Registry configuration.
//!
//! Institutional parameters fixed for the lifetime of a registry instance:
//! the email domain suffix, the program's final year, the system image
//! assigned to every record, and token metadata. Defaults match a four-year
//! program at `raf.rs`. Override via environment variables or a YAML file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default institutional email suffix.
pub const DEFAULT_EMAIL_DOMAIN: &str = "@raf.rs";
/// Default final year of study.
pub const DEFAULT_FINAL_YEAR: u8 = 4;
/// Default image assigned to every issued record.
pub const DEFAULT_IMAGE_URL: &str = "https://raf.rs/static/student-id/default.png";

/// Parameters of a registry instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Suffix every issued email must end with, including the `@`.
    pub email_domain: String,
    /// Year of study in which graduation is allowed.
    pub final_year: u8,
    /// Image URL stamped on every record and used as its token URI.
    pub default_image_url: String,
    /// Token collection name.
    pub token_name: String,
    /// Token collection symbol.
    pub token_symbol: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            final_year: DEFAULT_FINAL_YEAR,
            default_image_url: DEFAULT_IMAGE_URL.to_string(),
            token_name: "Student Identity".to_string(),
            token_symbol: "SID".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Defaults overlaid with environment variables.
    ///
    /// Variables:
    /// - `IDREG_EMAIL_DOMAIN` (default: `@raf.rs`)
    /// - `IDREG_FINAL_YEAR` (default: 4)
    /// - `IDREG_DEFAULT_IMAGE_URL`
    /// - `IDREG_TOKEN_NAME` (default: `Student Identity`)
    /// - `IDREG_TOKEN_SYMBOL` (default: `SID`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("IDREG_EMAIL_DOMAIN") {
            cfg.email_domain = v;
        }
        if let Ok(v) = std::env::var("IDREG_FINAL_YEAR") {
            cfg.final_year = v
                .parse()
                .map_err(|_| ConfigError::InvalidValue("IDREG_FINAL_YEAR".to_string(), v))?;
        }
        if let Ok(v) = std::env::var("IDREG_DEFAULT_IMAGE_URL") {
            cfg.default_image_url = v;
        }
        if let Ok(v) = std::env::var("IDREG_TOKEN_NAME") {
            cfg.token_name = v;
        }
        if let Ok(v) = std::env::var("IDREG_TOKEN_SYMBOL") {
            cfg.token_symbol = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a YAML file. Missing keys take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;
        Self::from_yaml_str(&raw)
    }

    /// Parse YAML text. Missing keys take their defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain_ok = self.email_domain.starts_with('@')
            && self.email_domain.len() > 1
            && self.email_domain[1..].contains('.')
            && !self.email_domain[1..].contains('@');
        if !domain_ok {
            return Err(ConfigError::InvalidValue(
                "email_domain".to_string(),
                self.email_domain.clone(),
            ));
        }
        if self.final_year == 0 {
            return Err(ConfigError::InvalidValue(
                "final_year".to_string(),
                self.final_year.to_string(),
            ));
        }
        if self.default_image_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "default_image_url".to_string(),
                self.default_image_url.clone(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("cannot read config file {0}: {1}")]
    Io(String, String),
    #[error("cannot parse config: {0}")]
    Parse(String),
}
