//! Tracing and metrics installation for host applications.

use std::str::FromStr;
use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use serde::Deserialize;
use thiserror::Error;
use tracing_error::ErrorLayer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Compact,
}

/// Logging settings for [`init`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    /// Default tracing directive, overridable via `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log level `{level}`: {message}")]
    Level { level: String, message: String },
    #[error("failed to install tracing subscriber: {message}")]
    Install { message: String },
}

/// Install a global tracing subscriber using the provided settings.
///
/// Optional for hosts that already run their own subscriber; metric
/// descriptions are registered either way so any exporter renders the
/// cache's series with units.
pub fn init(settings: &TelemetrySettings) -> Result<(), TelemetryError> {
    describe_metrics();

    let level = LevelFilter::from_str(&settings.level).map_err(|err| TelemetryError::Level {
        level: settings.level.clone(),
        message: err.to_string(),
    })?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install {
            message: err.to_string(),
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "galleria_page_hit_total",
            Unit::Count,
            "Total number of page reads served fresh from cache."
        );
        describe_counter!(
            "galleria_page_stale_total",
            Unit::Count,
            "Total number of page reads served past their TTL."
        );
        describe_counter!(
            "galleria_page_miss_total",
            Unit::Count,
            "Total number of page reads that found nothing cached."
        );
        describe_counter!(
            "galleria_item_hit_total",
            Unit::Count,
            "Total number of by-id reads served fresh from cache."
        );
        describe_counter!(
            "galleria_item_stale_total",
            Unit::Count,
            "Total number of by-id reads served past their TTL."
        );
        describe_counter!(
            "galleria_item_miss_total",
            Unit::Count,
            "Total number of by-id reads that found nothing cached."
        );
        describe_counter!(
            "galleria_flight_join_total",
            Unit::Count,
            "Total number of callers that joined an already in-flight fetch."
        );
        describe_counter!(
            "galleria_refresh_fail_total",
            Unit::Count,
            "Total number of refresh fetches that failed."
        );
        describe_counter!(
            "galleria_invalidate_total",
            Unit::Count,
            "Total number of explicit invalidations."
        );
        describe_counter!(
            "galleria_event_published_total",
            Unit::Count,
            "Total number of cache events published."
        );
        describe_histogram!(
            "galleria_refresh_ms",
            Unit::Milliseconds,
            "Refresh fetch latency in milliseconds."
        );
    });
}
