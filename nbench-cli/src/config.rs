//! Configuration loading from nbench.toml
//!
//! NBench configuration can be specified in a `nbench.toml` file in the project root.
//! The file is discovered by walking up from the current directory; command-line
//! flags override anything it sets.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up by [`NBenchConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "nbench.toml";

/// NBench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NBenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Process controls applied before any benchmark runs
    #[serde(default)]
    pub process: ProcessConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Overrides applied to every benchmark's settings.
///
/// Unset fields leave the value the benchmark was registered with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Background sampling period (e.g., "10ms")
    #[serde(default)]
    pub precision: Option<String>,
    /// Pause between trials (e.g., "5ms")
    #[serde(default)]
    pub settle_time: Option<String>,
    /// Skip the warmup trial
    #[serde(default)]
    pub skip_warmup: Option<bool>,
    /// Number of measured trials
    #[serde(default)]
    pub iterations: Option<u32>,
    /// Per-trial budget in throughput mode (e.g., "1s")
    #[serde(default)]
    pub run_time: Option<String>,
}

/// Process controls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Pin the process to this CPU
    #[serde(default)]
    pub pin_cpu: Option<usize>,
    /// Raise scheduling priority
    #[serde(default)]
    pub high_priority: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human", "json", "tracing"
    #[serde(default = "default_format")]
    pub format: String,
    /// Output directory for JSON reports
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: default_output_dir(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_output_dir() -> String {
    "target/nbench".to_string()
}

impl NBenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), "ignoring config: {e}");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# NBench Configuration

[runner]
# Background sampling period (uncomment to override)
# precision = "10ms"
# Pause between trials
# settle_time = "0ms"
# Skip the warmup trial
# skip_warmup = false
# Number of measured trials
# iterations = 10
# Per-trial budget in throughput mode
# run_time = "1s"

[process]
# Pin the benchmark process to one CPU (uncomment to enable)
# pin_cpu = 0
# Raise the scheduling priority of the benchmark process
high_priority = false

[output]
# Default output format: human, json, tracing
format = "human"
# Output directory for JSON reports
directory = "target/nbench"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "3s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic() || *c == 'µ')
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: f64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1.0,
            "us" | "µs" => 1_000.0,
            "ms" => 1_000_000.0,
            "s" | "" => 1_000_000_000.0,
            "m" | "min" => 60_000_000_000.0,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NBenchConfig::default();
        assert!(config.runner.precision.is_none());
        assert!(config.runner.iterations.is_none());
        assert!(!config.process.high_priority);
        assert_eq!(config.output.format, "human");
        assert_eq!(config.output.directory, "target/nbench");
    }

    #[test]
    fn test_parse_duration() {
        let parse = |s| NBenchConfig::parse_duration(s).unwrap();
        assert_eq!(parse("3s"), Duration::from_secs(3));
        assert_eq!(parse("10ms"), Duration::from_millis(10));
        assert_eq!(parse("100us"), Duration::from_micros(100));
        assert_eq!(parse("100µs"), Duration::from_micros(100));
        assert_eq!(parse("1000ns"), Duration::from_nanos(1000));
        assert_eq!(parse("2m"), Duration::from_secs(120));
        assert_eq!(parse("1.5s"), Duration::from_millis(1500));
        assert_eq!(parse("2"), Duration::from_secs(2));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(NBenchConfig::parse_duration("").is_err());
        assert!(NBenchConfig::parse_duration("fast").is_err());
        assert!(NBenchConfig::parse_duration("10 parsecs").is_err());
        assert!(NBenchConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            precision = "5ms"
            iterations = 20

            [process]
            pin_cpu = 2
        "#;

        let config: NBenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.precision.as_deref(), Some("5ms"));
        assert_eq!(config.runner.iterations, Some(20));
        assert_eq!(config.process.pin_cpu, Some(2));
        // Defaults should still apply
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_default_toml_parses() {
        let config: NBenchConfig = toml::from_str(&NBenchConfig::default_toml()).unwrap();
        assert!(!config.process.high_priority);
        assert_eq!(config.output.directory, "target/nbench");
    }
}
