//! Domain model and pure logic for the Vigil health-probe framework.
//!
//! Holds the measurement model, the sandboxed condition language used to
//! derive a status from observed values, and the key-value reader sensors
//! parse their settings from. No I/O lives here.

pub mod condition;
pub mod config;
pub mod error;
pub mod measurement;
pub mod metric_names;
pub mod types;
