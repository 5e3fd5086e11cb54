//! Tracing bootstrap, with optional OpenTelemetry span export.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "otel")]
static TRACER_PROVIDER: std::sync::OnceLock<opentelemetry_sdk::trace::SdkTracerProvider> =
    std::sync::OnceLock::new();

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Config at the given level, human-readable output.
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`TelemetryConfig::level`]. With the
/// `otel` feature, spans are additionally exported to stdout through
/// OpenTelemetry.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (human, json) = if config.json {
        (None, Some(fmt::layer().json().with_target(true)))
    } else {
        (Some(fmt::layer().with_target(true).with_level(true)), None)
    };

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(human)
        .with(json);

    #[cfg(feature = "otel")]
    let registry = {
        use opentelemetry::trace::TracerProvider as _;

        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("storyloom");
        let _ = TRACER_PROVIDER.set(provider);
        registry.with(tracing_opentelemetry::layer().with_tracer(tracer))
    };

    registry.try_init()?;
    Ok(())
}

/// Flush pending spans before exit. A no-op without the `otel` feature.
pub fn shutdown_telemetry() {
    #[cfg(feature = "otel")]
    if let Some(provider) = TRACER_PROVIDER.get() {
        let _ = provider.shutdown();
    }
}
