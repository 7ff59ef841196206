//! Agent configuration: environment settings and the probe definition file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use vigil_core::error::ProbeError;

/// Default seconds between probe cycles.
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

/// Default seconds a single probe may take before it is abandoned.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors that stop the agent before scheduling starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingEnv(&'static str),

    #[error("{name} must be {expected}, got `{value}`")]
    InvalidEnv {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("Failed to read probe file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse probe file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid probe definition: {0}")]
    Definition(String),

    #[error("Probe `{name}`: {source}")]
    Probe {
        name: String,
        #[source]
        source: ProbeError,
    },
}

/// Output format for log lines written to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse `LOG_FORMAT`; anything other than `json` means text.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Agent settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Path to the JSON probe definitions.
    pub probes_file: PathBuf,
    /// Time between the start of consecutive probe cycles.
    pub interval: Duration,
    /// HTTP timeout handed to sensors and per-probe deadline.
    pub timeout: Duration,
    /// Run a single cycle and exit.
    pub run_once: bool,
}

impl AgentConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default |
    /// |-----------------------|---------|
    /// | `PROBES_FILE`         | --      |
    /// | `PROBE_INTERVAL_SECS` | `30`    |
    /// | `PROBE_TIMEOUT_SECS`  | `10`    |
    /// | `PROBE_RUN_ONCE`      | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`AgentConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let probes_file = lookup("PROBES_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingEnv("PROBES_FILE"))?;

        let interval_secs = parse_secs(&lookup, "PROBE_INTERVAL_SECS", DEFAULT_INTERVAL_SECS)?;
        let timeout_secs = parse_secs(&lookup, "PROBE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let run_once = match lookup("PROBE_RUN_ONCE") {
            None => false,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "" | "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "PROBE_RUN_ONCE",
                        expected: "a boolean",
                        value: v,
                    })
                }
            },
        };

        Ok(Self {
            probes_file,
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
            run_once,
        })
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidEnv {
            name,
            expected: "a positive number of seconds",
            value: raw,
        }),
    }
}

/// Top-level shape of the probe definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeFile {
    pub probes: Vec<ProbeDefinition>,
}

/// One configured probe.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeDefinition {
    /// Unique, human-readable probe name.
    pub name: String,
    /// Registry type name, bare or namespaced (`example:random`).
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Sensor-specific settings.
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// Read and parse the probe definition file at `path`.
pub fn load_probe_file(path: &Path) -> Result<ProbeFile, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AgentConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AgentConfig::from_lookup(|name| env.get(name).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("PROBES_FILE", "probes.json")]).unwrap();
        assert_eq!(config.probes_file, PathBuf::from("probes.json"));
        assert_eq!(config.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.run_once);
    }

    #[test]
    fn probes_file_is_required() {
        assert_matches!(config_from(&[]), Err(ConfigError::MissingEnv("PROBES_FILE")));
        assert_matches!(
            config_from(&[("PROBES_FILE", "  ")]),
            Err(ConfigError::MissingEnv("PROBES_FILE"))
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("PROBES_FILE", "/etc/vigil/probes.json"),
            ("PROBE_INTERVAL_SECS", "5"),
            ("PROBE_TIMEOUT_SECS", "2"),
            ("PROBE_RUN_ONCE", "true"),
        ])
        .unwrap();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(2));
        assert!(config.run_once);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config_from(&[("PROBES_FILE", "p.json"), ("PROBE_TIMEOUT_SECS", "0")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "PROBE_TIMEOUT_SECS must be a positive number of seconds, got `0`"
        );
        assert_matches!(
            config_from(&[("PROBES_FILE", "p.json"), ("PROBE_INTERVAL_SECS", "soon")]),
            Err(ConfigError::InvalidEnv { name: "PROBE_INTERVAL_SECS", .. })
        );
        assert_matches!(
            config_from(&[("PROBES_FILE", "p.json"), ("PROBE_RUN_ONCE", "maybe")]),
            Err(ConfigError::InvalidEnv { name: "PROBE_RUN_ONCE", .. })
        );
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Text);
        assert_eq!(LogFormat::parse(None), LogFormat::Text);
    }

    #[test]
    fn loads_probe_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"probes": [
                {{"name": "dice", "type": "example:random",
                  "settings": {{"unhealthy": "value > 90", "degraded": "value > 70"}}}},
                {{"name": "web", "type": "http-request",
                  "settings": {{"url": "http://localhost:8080/health"}}}}
            ]}}"#
        )
        .unwrap();

        let parsed = load_probe_file(file.path()).unwrap();
        assert_eq!(parsed.probes.len(), 2);
        assert_eq!(parsed.probes[0].name, "dice");
        assert_eq!(parsed.probes[0].sensor_type, "example:random");
        assert_eq!(parsed.probes[1].settings["url"], "http://localhost:8080/health");
    }

    #[test]
    fn missing_probe_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_matches!(load_probe_file(&path), Err(ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_probe_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"probes": [{{"name": "x"}}]}}"#).unwrap();
        assert_matches!(load_probe_file(file.path()), Err(ConfigError::Parse { .. }));
    }
}
