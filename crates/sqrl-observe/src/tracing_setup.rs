//! Tracing subscriber initialization driven by the `[logging]` table of
//! `store.toml`.
//!
//! # Usage
//!
//! ```no_run
//! use sqrl_types::config::LogConfig;
//!
//! sqrl_observe::tracing_setup::init_tracing(&LogConfig::default()).unwrap();
//! // ... run the service ...
//! sqrl_observe::tracing_setup::shutdown_tracing();
//! ```

use std::sync::OnceLock;

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use sqrl_types::config::LogConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Parse the configured filter directives.
pub fn build_filter(config: &LogConfig) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter '{}'", config.filter))
}

/// Install the global tracing subscriber.
///
/// - Always installs a `fmt` layer with target visibility and span close
///   timing; JSON lines when `config.json` is set.
/// - When `config.otel` is set, additionally bridges spans to OpenTelemetry
///   using a stdout exporter.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber has
/// already been set.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<()> {
    let env_filter = build_filter(config)?;

    let plain_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });
    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    let otel_layer = config.otel.then(|| {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("sqrl-identity-store");

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(plain_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .context("global tracing subscriber already set")?;

    Ok(())
}

/// Flush pending traces and shut down the OpenTelemetry tracer provider.
///
/// Safe to call even when OTel was not enabled (no-op in that case).
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
