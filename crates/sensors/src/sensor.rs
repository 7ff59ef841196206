//! Capability interface shared by all sensor implementations.
//!
//! Defines [`Settings`], the parser contract for a sensor's configuration,
//! [`Sensor`], the trait every probe implements, and [`SensorContext`], the
//! host-supplied limits passed to sensors at construction.

use std::time::Duration;

use vigil_core::config::ConfigSection;
use vigil_core::error::ProbeError;
use vigil_core::measurement::Measurement;

/// Default bound on a single HTTP probe when the host does not supply one.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Limits and resources the hosting process hands to every sensor.
#[derive(Debug, Clone)]
pub struct SensorContext {
    /// Maximum wall-clock time for a network probe, including the body.
    pub http_timeout: Duration,
}

impl Default for SensorContext {
    fn default() -> Self {
        Self {
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

/// Sensor-specific configuration parsed from a settings section.
pub trait Settings: Sized {
    /// Parse and validate settings. Missing or malformed fields fail with
    /// [`ProbeError::InvalidConfig`] naming the field.
    fn deserialize(conf: &ConfigSection) -> Result<Self, ProbeError>;
}

/// A pluggable probe producing one measurement per invocation.
///
/// `measure` never fails: expected operational problems (unreachable
/// target, evaluation fault) are reported inside the measurement with a
/// diagnostic metric. Dropping the returned future abandons the probe and
/// releases any connection it holds.
pub trait Sensor: Sized + Send + Sync {
    type Settings: Settings;

    /// Build a sensor from parsed settings. All validation that can fail
    /// happens here so that scheduling never starts with a broken probe.
    fn configure(settings: Self::Settings, ctx: &SensorContext) -> Result<Self, ProbeError>;

    /// Take one measurement of the target.
    fn measure(&self) -> impl std::future::Future<Output = Measurement> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
