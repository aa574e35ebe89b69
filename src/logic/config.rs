//! Configuration module
//!
//! Every key is optional. Unset keys take the defaults in `constants`;
//! set but unparsable keys are rejected at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::*;
use crate::logic::dataset::DatasetFormat;
use crate::logic::model::{LabelStrategy, TrainerConfig};
use crate::logic::pipeline::Topics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Historical training data
    pub dataset_path: PathBuf,

    /// CSV or JSONL, inferred from the extension when unset
    pub dataset_format: DatasetFormat,

    pub input_topic: String,
    pub output_topic: String,

    /// k-means seed
    pub seed: u64,

    pub max_iterations: usize,
    pub n_init: usize,
    pub label_strategy: LabelStrategy,

    /// Inbound/outbound channel buffer
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let dataset_path = get(ENV_DATASET_PATH)
            .map(PathBuf::from)
            .unwrap_or(defaults.dataset_path);

        let dataset_format = match get(ENV_DATASET_FORMAT) {
            Some(raw) => parse_with(ENV_DATASET_FORMAT, &raw, |s| s.parse::<DatasetFormat>())?,
            None => DatasetFormat::from_path(&dataset_path),
        };

        let label_strategy = match get(ENV_LABEL_STRATEGY) {
            Some(raw) => parse_with(ENV_LABEL_STRATEGY, &raw, |s| s.parse::<LabelStrategy>())?,
            None => defaults.label_strategy,
        };

        let max_iterations =
            positive(ENV_MAX_ITERATIONS, get(ENV_MAX_ITERATIONS), defaults.max_iterations)?;
        let channel_capacity =
            positive(ENV_CHANNEL_CAPACITY, get(ENV_CHANNEL_CAPACITY), defaults.channel_capacity)?;

        Ok(Self {
            dataset_path,
            dataset_format,
            input_topic: get(ENV_INPUT_TOPIC).unwrap_or(defaults.input_topic),
            output_topic: get(ENV_OUTPUT_TOPIC).unwrap_or(defaults.output_topic),
            seed: parse_or(ENV_SEED, get(ENV_SEED), defaults.seed)?,
            max_iterations,
            n_init: positive(ENV_N_INIT, get(ENV_N_INIT), defaults.n_init)?,
            label_strategy,
            channel_capacity,
        })
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            seed: self.seed,
            max_iterations: self.max_iterations,
            n_init: self.n_init,
            label_strategy: self.label_strategy,
        }
    }

    pub fn topics(&self) -> Topics {
        Topics {
            input: self.input_topic.clone(),
            output: self.output_topic.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            dataset_format: DatasetFormat::Csv,
            input_topic: DEFAULT_INPUT_TOPIC.to_string(),
            output_topic: DEFAULT_OUTPUT_TOPIC.to_string(),
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            n_init: DEFAULT_N_INIT,
            label_strategy: LabelStrategy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn parse_with<T, E, P>(key: &'static str, raw: &str, parse: P) -> Result<T, ConfigError>
where
    P: FnOnce(&str) -> Result<T, E>,
    E: ToString,
{
    parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    match raw {
        Some(raw) => parse_with(key, &raw, |s| s.parse::<T>()),
        None => Ok(default),
    }
}

fn positive(key: &'static str, raw: Option<String>, default: usize) -> Result<usize, ConfigError> {
    let value = parse_or(key, raw.clone(), default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.unwrap_or_default(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.topics().input, "sensor");
        assert_eq!(config.trainer_config(), TrainerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("WASTAGE_DATASET_PATH", "/data/history.jsonl"),
            ("WASTAGE_INPUT_TOPIC", "home/room1/sensor"),
            ("WASTAGE_SEED", "7"),
            ("WASTAGE_N_INIT", "3"),
            ("WASTAGE_LABEL_STRATEGY", "fixed_cluster_id"),
        ])
        .unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/data/history.jsonl"));
        assert_eq!(config.dataset_format, DatasetFormat::Jsonl);
        assert_eq!(config.input_topic, "home/room1/sensor");
        assert_eq!(config.output_topic, "prediction");
        assert_eq!(config.seed, 7);
        assert_eq!(config.n_init, 3);
        assert_eq!(config.label_strategy, LabelStrategy::FixedClusterId);
    }

    #[test]
    fn test_explicit_format_wins_over_extension() {
        let config = config_from(&[
            ("WASTAGE_DATASET_PATH", "export.txt"),
            ("WASTAGE_DATASET_FORMAT", "jsonl"),
        ])
        .unwrap();
        assert_eq!(config.dataset_format, DatasetFormat::Jsonl);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = config_from(&[("WASTAGE_SEED", "  ")]).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = config_from(&[("WASTAGE_SEED", "abc")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WASTAGE_SEED", .. }));

        let err = config_from(&[("WASTAGE_MAX_ITERATIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WASTAGE_MAX_ITERATIONS", .. }));

        let err = config_from(&[("WASTAGE_LABEL_STRATEGY", "median")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "WASTAGE_LABEL_STRATEGY", .. }));
    }
}
