//! Simulation sensor that reports a problem *sometimes*.
//!
//! Each measurement draws a value in `[1, 100)` and classifies it with two
//! user-supplied conditions over the variable `value`. Useful for exercising
//! alerting and dashboards without a real target.

use rand::Rng;
use vigil_core::condition::{Condition, ConditionError, Context, ValueType};
use vigil_core::config::{self, ConfigSection};
use vigil_core::error::ProbeError;
use vigil_core::measurement::{Measurement, Metric, Status};
use vigil_core::metric_names::{METRIC_ERROR, METRIC_MESSAGE, METRIC_RANDOM};

use crate::sensor::{Sensor, SensorContext, Settings};

/// Smallest value drawn (inclusive).
pub const RANDOM_MIN: i64 = 1;

/// Upper bound of the draw (exclusive).
pub const RANDOM_MAX: i64 = 100;

/// Name the drawn value is bound to inside both conditions.
pub const VALUE_VARIABLE: &str = "value";

const VARIABLES: &[(&str, ValueType)] = &[(VALUE_VARIABLE, ValueType::Integer)];

#[derive(Debug, Clone, PartialEq)]
pub struct RandomSettings {
    /// Condition that marks the measurement UNHEALTHY.
    pub unhealthy: String,
    /// Condition that marks the measurement DEGRADED.
    pub degraded: String,
    /// Optional static message attached to every measurement.
    pub message: Option<String>,
    /// Section the settings were read from; prefixes construction errors.
    pub section: String,
}

impl Settings for RandomSettings {
    fn deserialize(conf: &ConfigSection) -> Result<Self, ProbeError> {
        Ok(Self {
            unhealthy: conf.str("unhealthy")?.to_string(),
            degraded: conf.str("degraded")?.to_string(),
            message: conf.opt_str("message")?.map(str::to_string),
            section: conf.path().to_string(),
        })
    }
}

#[derive(Debug)]
pub struct RandomSensor {
    unhealthy: Condition,
    degraded: Condition,
    message: Option<String>,
}

impl RandomSensor {
    /// Derive the status for `value`. `unhealthy` is checked first and wins
    /// ties; `degraded` is not evaluated when it holds.
    pub fn classify(&self, value: i64) -> Result<Status, ConditionError> {
        let context = Context::new().with(VALUE_VARIABLE, value);

        if self.unhealthy.evaluate(&context)? {
            Ok(Status::Unhealthy)
        } else if self.degraded.evaluate(&context)? {
            Ok(Status::Degraded)
        } else {
            Ok(Status::Healthy)
        }
    }

    /// Build the measurement for an already drawn `value`.
    ///
    /// An evaluation fault yields UNKNOWN with an extra `error` metric.
    pub fn measure_value(&self, value: i64) -> Measurement {
        let mut metrics = vec![Metric::integer(METRIC_RANDOM, value)];
        if let Some(message) = &self.message {
            metrics.push(Metric::string(METRIC_MESSAGE, message.as_str()));
        }

        let status = match self.classify(value) {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(value, error = %e, "Random sensor condition failed to evaluate");
                metrics.push(Metric::string(METRIC_ERROR, e.to_string()));
                Status::Unknown
            }
        };

        tracing::debug!(value, status = %status, "Random sensor measured");
        Measurement::now(status, metrics)
    }
}

impl Sensor for RandomSensor {
    type Settings = RandomSettings;

    fn configure(settings: RandomSettings, _ctx: &SensorContext) -> Result<Self, ProbeError> {
        let compile = |field: &str, expression: &str| {
            Condition::compile(expression, VARIABLES).map_err(|e| {
                let field = config::field_path(&settings.section, field);
                ProbeError::invalid_config(field, e.to_string())
            })
        };

        Ok(Self {
            unhealthy: compile("unhealthy", &settings.unhealthy)?,
            degraded: compile("degraded", &settings.degraded)?,
            message: settings.message,
        })
    }

    async fn measure(&self) -> Measurement {
        self.measure_value(draw())
    }
}

/// Roll a uniformly distributed value in `[RANDOM_MIN, RANDOM_MAX)`.
fn draw() -> i64 {
    rand::rng().random_range(RANDOM_MIN..RANDOM_MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
