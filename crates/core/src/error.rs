/// Configuration-time faults raised while resolving and building sensors.
///
/// Operational problems during `measure()` are never reported through this
/// type; they become part of the measurement itself.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Invalid config for `{field}`: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Unknown sensor type: {0}")]
    UnknownSensorType(String),
}

impl ProbeError {
    /// Shorthand for building an [`ProbeError::InvalidConfig`].
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
