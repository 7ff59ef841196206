//! Measurement model: the normalized output of every sensor invocation.
//!
//! A [`Measurement`] couples a health [`Status`] with an ordered list of
//! typed [`Metric`]s and the time it was captured.

use std::cmp::Ordering;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Health verdict of a single measurement.
///
/// `Healthy < Degraded < Unhealthy` by severity. `Unknown` means no verdict
/// could be reached and does not compare with the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Healthy,
    Degraded,
    Unhealthy,
    Unknown,
}

impl Status {
    /// Severity rank, or `None` for [`Status::Unknown`].
    pub fn severity(self) -> Option<u8> {
        match self {
            Self::Healthy => Some(0),
            Self::Degraded => Some(1),
            Self::Unhealthy => Some(2),
            Self::Unknown => None,
        }
    }

    /// Upper-case name used in logs and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Degraded => "DEGRADED",
            Self::Unhealthy => "UNHEALTHY",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// The most severe comparable status in `statuses`.
    ///
    /// `Unknown` entries are skipped; if nothing comparable remains (including
    /// an empty input) the result is `Unknown`.
    pub fn most_severe(statuses: impl IntoIterator<Item = Status>) -> Status {
        statuses
            .into_iter()
            .filter(|s| s.severity().is_some())
            .max_by_key(|s| s.severity())
            .unwrap_or(Status::Unknown)
    }
}

impl PartialOrd for Status {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        match (self.severity(), other.severity()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag describing how a metric value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Integer,
    Float,
    Boolean,
    String,
    Url,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Url => "url",
        }
    }
}

/// Raw value carried by a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

/// One named, typed observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub kind: MetricKind,
    pub value: MetricValue,
}

impl Metric {
    pub fn new(name: impl Into<String>, kind: MetricKind, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, MetricKind::Integer, MetricValue::Integer(value))
    }

    pub fn float(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, MetricKind::Float, MetricValue::Float(value))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, MetricKind::Boolean, MetricValue::Boolean(value))
    }

    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MetricKind::String, MetricValue::String(value.into()))
    }

    /// A string value tagged as a URL.
    pub fn url(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, MetricKind::Url, MetricValue::String(value.into()))
    }
}

/// Timestamped health verdict plus the metrics that support it.
///
/// Immutable once built. Metric names are unique: building a measurement
/// from a list that repeats a name keeps the first position and the last
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    timestamp: Timestamp,
    status: Status,
    metrics: Vec<Metric>,
}

impl Measurement {
    /// Capture a measurement stamped with the current time.
    pub fn now(status: Status, metrics: Vec<Metric>) -> Self {
        Self::at(Utc::now(), status, metrics)
    }

    /// Build a measurement with an explicit capture time.
    pub fn at(timestamp: Timestamp, status: Status, metrics: Vec<Metric>) -> Self {
        let mut unique: Vec<Metric> = Vec::with_capacity(metrics.len());
        for metric in metrics {
            match unique.iter_mut().find(|m| m.name == metric.name) {
                Some(existing) => *existing = metric,
                None => unique.push(metric),
            }
        }
        Self {
            timestamp,
            status,
            metrics: unique,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
