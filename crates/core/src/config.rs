use crate::emotion::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:5000/emotion";
pub const DEFAULT_STORAGE_URL: &str = "https://firebasestorage.googleapis.com";
pub const DEFAULT_STORAGE_BUCKET: &str = "serenify.appspot.com";
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_ROLLUP_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_POINTER_SENSITIVITY: f64 = 0.1;
pub const DEFAULT_MOOD: &str = "Happy";
pub const DEFAULT_MODEL_PATH: &str = "scene.gltf";
pub const DEFAULT_CHART_PATH: &str = "emotion-chart.png";
pub const ENV_CLASSIFIER_URL: &str = "SERENIFY_CLASSIFIER_URL";
pub const ENV_STORAGE_URL: &str = "SERENIFY_STORAGE_URL";
pub const ENV_STORAGE_BUCKET: &str = "SERENIFY_STORAGE_BUCKET";

/// Periods for the sampler's two timers: the short capture interval and the
/// longer rollup interval that recomputes the dominant emotion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaptureCadence {
    pub capture_ms: u64,
    pub rollup_ms: u64,
}

impl CaptureCadence {
    pub fn new(capture_ms: u64, rollup_ms: u64) -> Result<Self, ConfigError> {
        if capture_ms == 0 || rollup_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(Self {
            capture_ms,
            rollup_ms,
        })
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_millis(self.capture_ms)
    }

    pub fn rollup_interval(&self) -> Duration {
        Duration::from_millis(self.rollup_ms)
    }
}

impl Default for CaptureCadence {
    fn default() -> Self {
        Self {
            capture_ms: DEFAULT_CAPTURE_INTERVAL_MS,
            rollup_ms: DEFAULT_ROLLUP_INTERVAL_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct PointerSensitivity(f64);

impl PointerSensitivity {
    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::NonPositiveSensitivity);
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for PointerSensitivity {
    fn default() -> Self {
        Self(DEFAULT_POINTER_SENSITIVITY)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    pub base_url: Url,
    pub bucket: String,
}

impl StorageConfig {
    pub fn new(base_url: &str, bucket: String) -> Result<Self, ConfigError> {
        if bucket.trim().is_empty() {
            return Err(ConfigError::EmptyBucket);
        }
        Ok(Self {
            base_url: Url::parse(base_url)?,
            bucket,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub classifier_url: Url,
    pub storage: StorageConfig,
    pub cadence: CaptureCadence,
    pub sensitivity: PointerSensitivity,
    pub default_mood: EmotionLabel,
    pub model_path: PathBuf,
    pub chart_path: PathBuf,
    pub camera_index: i32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capture and rollup intervals must be > 0 ms")]
    ZeroInterval,
    #[error("pointer sensitivity must be a positive number")]
    NonPositiveSensitivity,
    #[error("storage bucket must not be empty")]
    EmptyBucket,
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_rejects_zero_intervals() {
        assert_eq!(
            CaptureCadence::new(0, 30_000),
            Err(ConfigError::ZeroInterval)
        );
        assert_eq!(
            CaptureCadence::new(3_000, 0),
            Err(ConfigError::ZeroInterval)
        );

        let cadence = CaptureCadence::new(3_000, 30_000).expect("nonzero");
        assert_eq!(cadence.capture_interval(), Duration::from_secs(3));
        assert_eq!(cadence.rollup_interval(), Duration::from_secs(30));
    }

    #[test]
    fn sensitivity_must_be_positive() {
        assert!(PointerSensitivity::new(0.0).is_err());
        assert!(PointerSensitivity::new(-0.1).is_err());
        assert!(PointerSensitivity::new(f64::NAN).is_err());
        assert_eq!(
            PointerSensitivity::new(0.1).expect("valid").value(),
            DEFAULT_POINTER_SENSITIVITY
        );
    }

    #[test]
    fn storage_config_rejects_blank_bucket() {
        assert_eq!(
            StorageConfig::new(DEFAULT_STORAGE_URL, "  ".to_owned()),
            Err(ConfigError::EmptyBucket)
        );
    }

    #[test]
    fn resolve_string_with_default_cli_takes_precedence() {
        let env = MapEnv::default().with_var(ENV_STORAGE_BUCKET, "env-bucket");
        let v = resolve_string_with_default(
            Some("cli-bucket".to_owned()),
            ENV_STORAGE_BUCKET,
            &env,
            "def",
        );
        assert_eq!(v, "cli-bucket");
    }

    #[test]
    fn resolve_string_with_default_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_STORAGE_BUCKET, "env-bucket");
        let v = resolve_string_with_default(None, ENV_STORAGE_BUCKET, &env, "def");
        assert_eq!(v, "env-bucket");
    }

    #[test]
    fn resolve_string_with_default_default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_STORAGE_BUCKET, &env, "def");
        assert_eq!(v, "def");
    }
}
