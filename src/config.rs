use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::link::HostPolicy;
use crate::metrics::{GeneratorConfig, MetricsGenerator, RatioRange};

/// Largest view count that converts to `f64` exactly (2^53).
pub const MAX_VIEWS: u64 = 1 << 53;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub host_policy: HostPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub simulated_latency_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 1200,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub generator: GeneratorConfig,
    pub link: LinkConfig,
    pub server: ServerConfig,
}

impl AnalyzerConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                Self::from_toml(&contents)?
            } else {
                AnalyzerConfig::default()
            }
        } else {
            AnalyzerConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn validate(&self) -> Result<(), String> {
        let generator = &self.generator;
        if generator.views_floor == 0 {
            return Err("invalid config: generator.views_floor must be positive".to_string());
        }
        if generator.views_span == 0 {
            return Err("invalid config: generator.views_span must be positive".to_string());
        }
        match generator.views_floor.checked_add(generator.views_span) {
            Some(ceiling) if ceiling <= MAX_VIEWS => {}
            _ => {
                return Err(format!(
                    "invalid config: generator.views_floor + views_span must not exceed {}",
                    MAX_VIEWS
                ))
            }
        }
        check_ratio("likes", &generator.likes)?;
        check_ratio("comments", &generator.comments)?;
        check_ratio("shares", &generator.shares)?;
        Ok(())
    }

    pub fn generator(&self) -> MetricsGenerator {
        MetricsGenerator::from_config(&self.generator)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(title) = env::var("ANALYZER_TITLE") {
            if !title.trim().is_empty() {
                self.generator.title = title;
            }
        }
        if let Ok(floor) = env::var("ANALYZER_VIEWS_FLOOR") {
            if let Ok(value) = floor.parse::<u64>() {
                self.generator.views_floor = value;
            }
        }
        if let Ok(span) = env::var("ANALYZER_VIEWS_SPAN") {
            if let Ok(value) = span.parse::<u64>() {
                self.generator.views_span = value;
            }
        }
        if let Ok(policy) = env::var("ANALYZER_HOST_POLICY") {
            if let Some(value) = HostPolicy::from_str(&policy) {
                self.link.host_policy = value;
            }
        }
        if let Ok(latency) = env::var("ANALYZER_LATENCY_MS") {
            if let Ok(value) = latency.parse::<u64>() {
                self.server.simulated_latency_ms = value;
            }
        }
    }
}

fn check_ratio(name: &str, range: &RatioRange) -> Result<(), String> {
    if range.is_valid() {
        return Ok(());
    }
    Err(format!(
        "invalid config: generator.{} must satisfy 0 <= min <= max < 1 (got {}..{})",
        name, range.min, range.max
    ))
}

fn default_config_path() -> Option<PathBuf> {
    env::var("ANALYZER_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/analyzer.toml")))
}
