//! Configuration parsing: YAML with environment-variable substitution

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("opensearch.url is required")]
    MissingUrl,

    #[error("opensearch.indices cannot be empty")]
    NoIndices,

    #[error("query.max_results must be positive")]
    BadMaxResults,

    #[error("analysis.sample_size must be positive")]
    BadSampleSize,
}

// Main config structure
#[derive(Debug, Deserialize)]
pub struct Config {
    pub opensearch: OpenSearchConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct OpenSearchConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub indices: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub max_results: u64,

    // seconds
    pub timeout: u64,

    pub keyword: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_results: 10_000,
            timeout: 30,
            keyword: "error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub time_range: String,

    // samples retained per error group
    pub sample_size: usize,

    pub density: DensityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            time_range: "24h".to_string(),
            sample_size: 5,
            density: DensityConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub peak_window_minutes: u64,
    pub high_density_threshold: u64,
    pub critical_density_threshold: u64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            peak_window_minutes: 5,
            high_density_threshold: 100,
            critical_density_threshold: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: String,
    pub data_path: String,
    pub pending_path: String,
    pub retention_days: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: "./reports".to_string(),
            data_path: "./data".to_string(),
            pending_path: "./pending".to_string(),
            retention_days: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration from a YAML file. `${VAR}` references are substituted
/// from the environment before parsing; undefined variables become the
/// empty string.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let content = substitute_env_vars(&content);

    let config: Config = serde_yaml::from_str(&content)?;
    validate(&config)?;

    Ok(config)
}

fn substitute_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let end = start + end;

        let var_name = &result[start + 2..end];
        let value = env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[end + 1..]);
    }

    result
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.opensearch.url.is_empty() {
        return Err(ConfigError::MissingUrl);
    }
    if config.opensearch.indices.is_empty() {
        return Err(ConfigError::NoIndices);
    }
    if config.query.max_results == 0 {
        return Err(ConfigError::BadMaxResults);
    }
    if config.analysis.sample_size == 0 {
        return Err(ConfigError::BadSampleSize);
    }
    Ok(())
}
