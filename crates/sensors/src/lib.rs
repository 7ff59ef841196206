//! Built-in sensors and the registry the agent resolves them through.
//!
//! Every sensor implements [`sensor::Sensor`]: settings are parsed and
//! validated once in `configure`, and each `measure()` call yields exactly
//! one [`vigil_core::measurement::Measurement`].

pub mod http_request;
pub mod random;
pub mod registry;
pub mod sensor;
