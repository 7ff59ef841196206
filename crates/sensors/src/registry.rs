//! Static registry of built-in sensor types.
//!
//! The set of sensors is closed and known at build time: each type name maps
//! to a [`SensorKind`], which selects the settings parser and constructor for
//! that sensor. Adding a sensor means adding a variant to [`SensorKind`],
//! [`SensorSettings`] and [`AnySensor`] plus an entry in [`SENSORS`].

use vigil_core::config::ConfigSection;
use vigil_core::error::ProbeError;
use vigil_core::measurement::Measurement;

use crate::http_request::{HttpRequestSensor, HttpRequestSettings};
use crate::random::{RandomSensor, RandomSettings};
use crate::sensor::{Sensor, SensorContext, Settings};

/// Namespace the built-in sensors are published under; `example:random`
/// and `random` name the same sensor.
pub const PLUGIN_NAMESPACE: &str = "example";

/// Closed set of sensor implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Random,
    HttpRequest,
}

impl SensorKind {
    /// Parse the settings section for this kind of sensor.
    pub fn deserialize(self, conf: &ConfigSection) -> Result<SensorSettings, ProbeError> {
        match self {
            Self::Random => RandomSettings::deserialize(conf).map(SensorSettings::Random),
            Self::HttpRequest => {
                HttpRequestSettings::deserialize(conf).map(SensorSettings::HttpRequest)
            }
        }
    }
}

/// Registry entry binding a type name to its implementation.
#[derive(Debug, Clone, Copy)]
pub struct SensorDef {
    pub type_name: &'static str,
    pub kind: SensorKind,
}

/// All sensors known to this build.
pub static SENSORS: &[SensorDef] = &[
    SensorDef {
        type_name: "random",
        kind: SensorKind::Random,
    },
    SensorDef {
        type_name: "http-request",
        kind: SensorKind::HttpRequest,
    },
];

/// Parsed settings for any registered sensor.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorSettings {
    Random(RandomSettings),
    HttpRequest(HttpRequestSettings),
}

impl SensorSettings {
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Random(_) => SensorKind::Random,
            Self::HttpRequest(_) => SensorKind::HttpRequest,
        }
    }

    /// Construct the sensor these settings belong to.
    pub fn configure(self, ctx: &SensorContext) -> Result<AnySensor, ProbeError> {
        match self {
            Self::Random(s) => RandomSensor::configure(s, ctx).map(AnySensor::Random),
            Self::HttpRequest(s) => {
                HttpRequestSensor::configure(s, ctx).map(AnySensor::HttpRequest)
            }
        }
    }
}

/// A constructed sensor of any registered kind.
#[derive(Debug)]
pub enum AnySensor {
    Random(RandomSensor),
    HttpRequest(HttpRequestSensor),
}

impl AnySensor {
    pub fn kind(&self) -> SensorKind {
        match self {
            Self::Random(_) => SensorKind::Random,
            Self::HttpRequest(_) => SensorKind::HttpRequest,
        }
    }

    pub async fn measure(&self) -> Measurement {
        match self {
            Self::Random(sensor) => sensor.measure().await,
            Self::HttpRequest(sensor) => sensor.measure().await,
        }
    }
}

/// Find the registry entry for `type_name`.
///
/// Accepts the bare name or one qualified with [`PLUGIN_NAMESPACE`].
pub fn lookup(type_name: &str) -> Result<&'static SensorDef, ProbeError> {
    let bare = match type_name.split_once(':') {
        Some((PLUGIN_NAMESPACE, name)) => name,
        Some(_) => return Err(ProbeError::UnknownSensorType(type_name.to_string())),
        None => type_name,
    };

    SENSORS
        .iter()
        .find(|def| def.type_name == bare)
        .ok_or_else(|| ProbeError::UnknownSensorType(type_name.to_string()))
}

/// Resolve `type_name`, parse `conf` and construct the sensor.
///
/// Nothing is constructed unless every step succeeds.
pub fn build(
    type_name: &str,
    conf: &ConfigSection,
    ctx: &SensorContext,
) -> Result<AnySensor, ProbeError> {
    let def = lookup(type_name)?;
    let settings = def.kind.deserialize(conf)?;
    let sensor = settings.configure(ctx)?;
    tracing::debug!(sensor_type = def.type_name, section = conf.path(), "Sensor configured");
    Ok(sensor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
