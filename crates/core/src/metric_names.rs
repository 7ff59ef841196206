//! Well-known metric names emitted by the built-in sensors.
//!
//! Consumers of measurements (dashboards, alert rules) key on these, so they
//! are part of the output contract.

/// The value drawn by the random sensor.
pub const METRIC_RANDOM: &str = "random";

/// Static message attached by the random sensor when configured.
pub const METRIC_MESSAGE: &str = "message";

/// The URL probed by the HTTP request sensor.
pub const METRIC_URL: &str = "url";

/// HTTP status code returned by the probed endpoint.
pub const METRIC_CODE: &str = "code";

/// Response body returned by the probed endpoint.
pub const METRIC_RESPONSE: &str = "response";

/// Diagnostic describing why a measurement could not reach a verdict.
pub const METRIC_ERROR: &str = "error";

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_unique() {
        let names = [
            METRIC_RANDOM,
            METRIC_MESSAGE,
            METRIC_URL,
            METRIC_CODE,
            METRIC_RESPONSE,
            METRIC_ERROR,
        ];
        let mut unique = names.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), names.len(), "metric names must be unique");
    }
}
