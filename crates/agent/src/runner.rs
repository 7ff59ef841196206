//! Probe construction and the measurement loop.
//!
//! Every configured probe is resolved through the sensor registry before the
//! first cycle. Each cycle measures all probes concurrently, bounds each one
//! by the per-probe deadline, and emits one report per probe as a JSON line
//! on stdout.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;
use vigil_core::config::ConfigSection;
use vigil_core::measurement::{Measurement, Metric, Status};
use vigil_core::metric_names::METRIC_ERROR;
use vigil_sensors::registry::{self, AnySensor};
use vigil_sensors::sensor::SensorContext;

use crate::config::{AgentConfig, ConfigError, ProbeDefinition};

/// A named, fully constructed sensor ready to be scheduled.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    pub sensor_type: String,
    pub sensor: Arc<AnySensor>,
}

/// One probe's result for one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub probe: String,
    #[serde(rename = "type")]
    pub sensor_type: String,
    pub measurement: Measurement,
}

/// Resolve and construct every probe definition.
///
/// Fails on the first invalid definition; nothing is scheduled unless all
/// probes build.
pub fn build_probes(
    definitions: Vec<ProbeDefinition>,
    ctx: &SensorContext,
) -> Result<Vec<Probe>, ConfigError> {
    let mut seen = HashSet::new();
    let mut probes = Vec::with_capacity(definitions.len());

    for def in definitions {
        let name = def.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::Definition("probe name must not be empty".to_string()));
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::Definition(format!("duplicate probe name `{name}`")));
        }

        let probe_err = |source| ConfigError::Probe {
            name: name.clone(),
            source,
        };
        let section = ConfigSection::from_value(format!("probes.{name}"), def.settings)
            .map_err(probe_err)?;
        let sensor = registry::build(&def.sensor_type, &section, ctx).map_err(probe_err)?;

        tracing::info!(probe = %name, sensor_type = %def.sensor_type, "Probe configured");
        probes.push(Probe {
            name,
            sensor_type: def.sensor_type,
            sensor: Arc::new(sensor),
        });
    }

    Ok(probes)
}

/// Measurement recorded for a probe that missed its deadline or whose task
/// died.
fn abandoned(reason: String) -> Measurement {
    Measurement::now(Status::Unknown, vec![Metric::string(METRIC_ERROR, reason)])
}

/// Measure every probe once, concurrently.
///
/// Reports come back in probe order. A probe exceeding `deadline` is dropped
/// mid-flight (releasing its connection) and reported as UNKNOWN.
pub async fn run_cycle(probes: &[Probe], deadline: Duration) -> Vec<ProbeReport> {
    let handles: Vec<_> = probes
        .iter()
        .map(|probe| {
            let sensor = Arc::clone(&probe.sensor);
            tokio::spawn(async move { tokio::time::timeout(deadline, sensor.measure()).await })
        })
        .collect();

    let mut reports = Vec::with_capacity(probes.len());
    for (probe, handle) in probes.iter().zip(handles) {
        let measurement = match handle.await {
            Ok(Ok(measurement)) => measurement,
            Ok(Err(_elapsed)) => {
                tracing::warn!(
                    probe = %probe.name,
                    deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    "Probe abandoned after deadline"
                );
                abandoned(format!(
                    "probe abandoned after {}ms",
                    deadline.as_millis()
                ))
            }
            Err(e) => {
                tracing::error!(probe = %probe.name, error = %e, "Probe task failed");
                abandoned(format!("probe task failed: {e}"))
            }
        };

        reports.push(ProbeReport {
            probe: probe.name.clone(),
            sensor_type: probe.sensor_type.clone(),
            measurement,
        });
    }

    reports
}

/// Write each report as one JSON line.
pub fn emit_reports(out: &mut impl Write, reports: &[ProbeReport]) -> std::io::Result<()> {
    for report in reports {
        let line = serde_json::to_string(report)?;
        writeln!(out, "{line}")?;
    }
    out.flush()
}

/// Run probe cycles on a fixed interval, or once if configured.
pub async fn run(probes: &[Probe], config: &AgentConfig) {
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let reports = run_cycle(probes, config.timeout).await;
        if let Err(e) = emit_reports(&mut std::io::stdout().lock(), &reports) {
            tracing::error!(error = %e, "Failed to write probe reports");
        }

        let worst = Status::most_severe(reports.iter().map(|r| r.measurement.status()));
        let unknown = reports
            .iter()
            .filter(|r| r.measurement.status() == Status::Unknown)
            .count();
        tracing::info!(
            probes = reports.len(),
            unknown,
            worst = %worst,
            "Probe cycle complete"
        );

        if config.run_once {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;
    use vigil_core::error::ProbeError;

    use super::*;

    fn definition(name: &str, sensor_type: &str, settings: serde_json::Value) -> ProbeDefinition {
        ProbeDefinition {
            name: name.to_string(),
            sensor_type: sensor_type.to_string(),
            settings,
        }
    }

    fn always_healthy(name: &str) -> ProbeDefinition {
        definition(
            name,
            "example:random",
            json!({"unhealthy": "value > 100", "degraded": "value > 100"}),
        )
    }

    fn always_unhealthy(name: &str) -> ProbeDefinition {
        definition(
            name,
            "random",
            json!({"unhealthy": "value >= 1", "degraded": "false", "message": "always"}),
        )
    }

    #[test]
    fn builds_all_probes() {
        let probes = build_probes(
            vec![always_healthy("a"), always_unhealthy("b")],
            &SensorContext::default(),
        )
        .unwrap();
        assert_eq!(probes.len(), 2);
        assert_eq!(probes[1].name, "b");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = build_probes(
            vec![always_healthy("a"), always_healthy("a")],
            &SensorContext::default(),
        );
        assert_matches!(result, Err(ConfigError::Definition(msg)) if msg.contains("duplicate"));
    }

    #[test]
    fn empty_name_is_rejected() {
        let result = build_probes(vec![always_healthy(" ")], &SensorContext::default());
        assert_matches!(result, Err(ConfigError::Definition(_)));
    }

    #[test]
    fn unknown_type_names_the_probe() {
        let result = build_probes(
            vec![definition("web", "example:ping", json!({}))],
            &SensorContext::default(),
        );
        assert_matches!(
            result,
            Err(ConfigError::Probe { name, source: ProbeError::UnknownSensorType(_) }) if name == "web"
        );
    }

    #[test]
    fn invalid_settings_name_the_field() {
        let result = build_probes(
            vec![definition("web", "http-request", json!({"url": ""}))],
            &SensorContext::default(),
        );
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Probe `web`: Invalid config for `probes.web.url`: must not be empty"
        );
    }

    #[test]
    fn invalid_condition_names_the_dotted_field() {
        let result = build_probes(
            vec![definition(
                "dice",
                "random",
                json!({"unhealthy": "value >", "degraded": "value > 70"}),
            )],
            &SensorContext::default(),
        );
        assert_matches!(
            result,
            Err(ConfigError::Probe {
                name,
                source: ProbeError::InvalidConfig { field, .. },
            }) if name == "dice" && field == "probes.dice.unhealthy"
        );
    }

    #[test]
    fn deeply_nested_condition_fails_cleanly() {
        let nested = format!("{}value > 1{}", "(".repeat(10_000), ")".repeat(10_000));
        let result = build_probes(
            vec![definition(
                "dice",
                "random",
                json!({"unhealthy": nested, "degraded": "value > 70"}),
            )],
            &SensorContext::default(),
        );
        assert_matches!(
            result,
            Err(ConfigError::Probe {
                source: ProbeError::InvalidConfig { field, .. },
                ..
            }) if field == "probes.dice.unhealthy"
        );
    }

    #[tokio::test]
    async fn cycle_reports_in_probe_order() {
        let probes = build_probes(
            vec![always_unhealthy("first"), always_healthy("second")],
            &SensorContext::default(),
        )
        .unwrap();

        let reports = run_cycle(&probes, Duration::from_secs(5)).await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].probe, "first");
        assert_eq!(reports[0].measurement.status(), Status::Unhealthy);
        assert_eq!(reports[1].probe, "second");
        assert_eq!(reports[1].measurement.status(), Status::Healthy);
    }

    #[tokio::test]
    async fn slow_probe_is_abandoned_as_unknown() {
        // Accept connections but never answer.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let ctx = SensorContext {
            http_timeout: Duration::from_secs(30),
        };
        let probes = build_probes(
            vec![
                definition(
                    "stuck",
                    "http-request",
                    json!({"url": format!("http://{addr}/")}),
                ),
                always_healthy("quick"),
            ],
            &ctx,
        )
        .unwrap();

        let reports = run_cycle(&probes, Duration::from_millis(200)).await;
        assert_eq!(reports[0].measurement.status(), Status::Unknown);
        assert!(reports[0].measurement.metric("error").is_some());
        assert_eq!(reports[1].measurement.status(), Status::Healthy);
    }

    #[tokio::test]
    async fn reports_are_emitted_as_json_lines() {
        let probes = build_probes(vec![always_unhealthy("disk")], &SensorContext::default())
            .unwrap();
        let reports = run_cycle(&probes, Duration::from_secs(5)).await;

        let mut out = Vec::new();
        emit_reports(&mut out, &reports).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["probe"], "disk");
        assert_eq!(value["type"], "random");
        assert_eq!(value["measurement"]["status"], "UNHEALTHY");
        assert_eq!(value["measurement"]["metrics"][1]["value"], "always");
    }
}
