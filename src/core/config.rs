//! Externally supplied configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment
//! (a `.env` file is honoured). Every field has a default so an empty file,
//! or no file at all, is a valid configuration.

use std::path::Path;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::TransformMode;
use crate::utils::{AcceptPolicy, ConfigError, TargetFormat, ValidatorSet};

pub const CONVERT_API_SECRET_VAR: &str = "CONVERT_API_SECRET";
pub const CONVERT_API_ENDPOINT_VAR: &str = "CONVERT_API_ENDPOINT";
pub const REMOVE_BG_API_KEY_VAR: &str = "REMOVE_BG_API_KEY";
pub const REMOVE_BG_ENDPOINT_VAR: &str = "REMOVE_BG_ENDPOINT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub compress: CompressConfig,
    pub convert: ConvertConfig,
    pub remove_background: RemoveBackgroundConfig,
    pub http: HttpConfig,
}

/// Settings for the local compressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Factor applied to both raster dimensions, in (0, 1]
    pub scale: f32,
    /// Lossy encoder quality, in (0, 1]
    pub quality: f32,
    pub accept: AcceptPolicy,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            scale: 0.5,
            quality: 0.7,
            accept: AcceptPolicy::for_mode(TransformMode::Compress),
        }
    }
}

/// Settings for the remote conversion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Target used for entries that did not pick one
    pub default_target: TargetFormat,
    pub accept: AcceptPolicy,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://v2.convertapi.com".to_string(),
            api_key: String::new(),
            default_target: TargetFormat::Png,
            accept: AcceptPolicy::for_mode(TransformMode::Convert),
        }
    }
}

/// Settings for the remote background-removal service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoveBackgroundConfig {
    pub endpoint: String,
    pub api_key: String,
    pub accept: AcceptPolicy,
}

impl Default for RemoveBackgroundConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.remove.bg/v1.0".to_string(),
            api_key: String::new(),
            accept: AcceptPolicy::for_mode(TransformMode::RemoveBackground),
        }
    }
}

/// HTTP client settings shared by the remote strategies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout; unset means requests may wait indefinitely
    pub timeout_secs: Option<u64>,
}

impl AppConfig {
    /// Reads `path` if given, applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Missing .env is the normal case
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Overrides credentials and endpoints from `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(CONVERT_API_SECRET_VAR) {
            self.convert.api_key = key;
        }
        if let Some(endpoint) = non_empty(CONVERT_API_ENDPOINT_VAR) {
            self.convert.endpoint = endpoint;
        }
        if let Some(key) = non_empty(REMOVE_BG_API_KEY_VAR) {
            self.remove_background.api_key = key;
        }
        if let Some(endpoint) = non_empty(REMOVE_BG_ENDPOINT_VAR) {
            self.remove_background.endpoint = endpoint;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, value: f32| {
            if value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be in (0, 1], got {value}")))
            }
        };
        unit("compress.scale", self.compress.scale)?;
        unit("compress.quality", self.compress.quality)?;

        for (name, policy) in [
            ("compress", &self.compress.accept),
            ("convert", &self.convert.accept),
            ("remove_background", &self.remove_background.accept),
        ] {
            if policy.max_bytes == 0 {
                return Err(ConfigError::Invalid(format!("{name}.accept.max_bytes cannot be 0")));
            }
        }
        Ok(())
    }

    pub fn validators(&self) -> ValidatorSet {
        ValidatorSet::new(
            self.compress.accept.clone(),
            self.convert.accept.clone(),
            self.remove_background.accept.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.compress.scale, 0.5);
        assert_eq!(config.compress.quality, 0.7);
        assert_eq!(config.remove_background.accept.max_bytes, 12 * 1024 * 1024);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [compress]
            quality = 0.5

            [convert]
            default_target = "webp"

            [convert.accept]
            max_bytes = 1024
            extensions = ["png"]

            [http]
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.compress.quality, 0.5);
        assert_eq!(config.compress.scale, 0.5);
        assert_eq!(config.convert.default_target, TargetFormat::Webp);
        assert_eq!(config.convert.accept.max_bytes, 1024);
        assert!(config.convert.accept.media_types.is_empty());
        assert_eq!(config.http.timeout_secs, Some(30));
    }

    #[test]
    fn environment_overrides_credentials() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            CONVERT_API_SECRET_VAR => Some("secret".to_string()),
            REMOVE_BG_API_KEY_VAR => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.convert.api_key, "secret");
        assert!(config.remove_background.api_key.is_empty());
    }

    #[test]
    fn rejects_out_of_range_factors() {
        let mut config = AppConfig::default();
        config.compress.scale = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.compress.scale = 1.0;
        config.compress.quality = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_size_limit() {
        let mut config = AppConfig::default();
        config.remove_background.accept.max_bytes = 0;
        assert!(config.validate().is_err());
    }
}
