//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for applications embedding the pipeline.
///
/// Installs a fmt layer filtered by `RUST_LOG`. With the `otel` feature, spans
/// are additionally exported to stdout through OpenTelemetry.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_filter(EnvFilter::from_default_env());

    #[cfg(feature = "otel")]
    {
        use opentelemetry::trace::TracerProvider as _;
        use opentelemetry_sdk::{
            Resource,
            trace::{RandomIdGenerator, Sampler, TracerProvider},
        };

        let provider = TracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_id_generator(RandomIdGenerator::default())
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(Resource::default())
            .build();
        let tracer = provider.tracer("montage");
        opentelemetry::global::set_tracer_provider(provider);

        let telemetry_layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(EnvFilter::from_default_env());

        tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(fmt_layer)
            .try_init()?;
        return Ok(());
    }

    #[cfg(not(feature = "otel"))]
    {
        tracing_subscriber::registry().with(fmt_layer).try_init()?;
        Ok(())
    }
}

/// Flush pending spans before exit. No-op without the `otel` feature.
pub fn shutdown_telemetry() {
    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();
}
