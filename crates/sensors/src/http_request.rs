//! HTTP endpoint probe.
//!
//! Issues a single `GET` to the configured URL and maps the response code to
//! a status. Redirects are reported as-is rather than followed, so a `3xx`
//! target shows up as DEGRADED.

use std::error::Error as _;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Url;
use vigil_core::config::{self, ConfigSection};
use vigil_core::error::ProbeError;
use vigil_core::measurement::{Measurement, Metric, Status};
use vigil_core::metric_names::{METRIC_CODE, METRIC_ERROR, METRIC_RESPONSE, METRIC_URL};

use crate::sensor::{Sensor, SensorContext, Settings};

/// Recorded in place of a body that arrived with a status line but could
/// not be read.
const UNREADABLE_BODY: &str = "<unreadable body>";

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequestSettings {
    /// Absolute `http` or `https` URL to probe.
    pub url: String,
    /// Per-probe request timeout; never exceeds the host's HTTP timeout.
    pub timeout: Option<Duration>,
    /// Section the settings were read from; prefixes construction errors.
    pub section: String,
}

impl Settings for HttpRequestSettings {
    fn deserialize(conf: &ConfigSection) -> Result<Self, ProbeError> {
        let url = conf.str("url")?.trim();
        let invalid = |reason: String| ProbeError::invalid_config(conf.field_path("url"), reason);

        if url.is_empty() {
            return Err(invalid("must not be empty".to_string()));
        }
        let parsed = Url::parse(url).map_err(|e| invalid(format!("not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported scheme `{}`, expected http or https",
                parsed.scheme()
            )));
        }

        let timeout = match conf.opt_u64("timeout_ms")? {
            Some(0) => {
                return Err(ProbeError::invalid_config(
                    conf.field_path("timeout_ms"),
                    "must be greater than zero",
                ))
            }
            ms => ms.map(Duration::from_millis),
        };

        Ok(Self {
            url: url.to_string(),
            timeout,
            section: conf.path().to_string(),
        })
    }
}

/// Map an HTTP status code to a health status.
///
/// | code         | status    |
/// |--------------|-----------|
/// | `[200, 300)` | HEALTHY   |
/// | `[300, 400)` | DEGRADED  |
/// | `[400, 600)` | UNHEALTHY |
/// | otherwise    | UNKNOWN   |
pub fn status_for_code(code: u16) -> Status {
    match code {
        200..=299 => Status::Healthy,
        300..=399 => Status::Degraded,
        400..=599 => Status::Unhealthy,
        _ => Status::Unknown,
    }
}

#[derive(Debug)]
pub struct HttpRequestSensor {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpRequestSensor {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Describe a request that produced no response at all.
    fn describe_failure(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            return format!("request timed out after {}ms", self.timeout.as_millis());
        }

        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl Sensor for HttpRequestSensor {
    type Settings = HttpRequestSettings;

    fn configure(settings: HttpRequestSettings, ctx: &SensorContext) -> Result<Self, ProbeError> {
        let timeout = settings
            .timeout
            .map_or(ctx.http_timeout, |t| t.min(ctx.http_timeout));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| {
                ProbeError::invalid_config(
                    config::field_path(&settings.section, "url"),
                    format!("failed to build HTTP client: {e}"),
                )
            })?;

        Ok(Self {
            client,
            url: settings.url,
            timeout,
        })
    }

    async fn measure(&self) -> Measurement {
        let url_metric = Metric::url(METRIC_URL, self.url.as_str());

        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                let cause = self.describe_failure(&e);
                tracing::warn!(url = %self.url, error = %cause, "HTTP probe failed");
                return Measurement::now(
                    Status::Unknown,
                    vec![url_metric, Metric::string(METRIC_ERROR, cause)],
                );
            }
        };

        let code = response.status().as_u16();
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::warn!(url = %self.url, code, error = %e, "HTTP probe body unreadable");
            UNREADABLE_BODY.to_string()
        });
        let status = status_for_code(code);

        tracing::debug!(url = %self.url, code, status = %status, "HTTP probe measured");

        Measurement::now(
            status,
            vec![
                url_metric,
                Metric::integer(METRIC_CODE, i64::from(code)),
                Metric::string(METRIC_RESPONSE, body),
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
