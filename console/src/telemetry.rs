//! Tracing and Prometheus setup.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use std::net::{Ipv4Addr, SocketAddr};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber
///
/// Logs go to stderr so they do not interleave with the rendered board.
pub fn init_tracing(filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Serve `/metrics` on the given port
///
/// Must be called from within the tokio runtime.
///
/// # Errors
///
/// Returns [`BuildError`] if the recorder is already installed or the
/// listener cannot be set up.
pub fn install_metrics(port: u16) -> Result<(), BuildError> {
    let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(address)
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1],
        )?
        .install()?;

    register_metrics();
    tracing::info!(%address, "Metrics exporter listening");
    Ok(())
}

fn register_metrics() {
    describe_counter!("store.commands.total", "Actions accepted by a store");
    describe_counter!("store.effects.executed", "Effects started, by type");
    describe_histogram!("store.reducer.duration_seconds", "Time spent in reducers");
    describe_counter!("store.shutdown.initiated", "Store shutdowns started");
    describe_counter!("store.shutdown.completed", "Store shutdowns that drained in time");
    describe_counter!("store.shutdown.timeout", "Store shutdowns that timed out");
    describe_counter!("store.shutdown.rejected_actions", "Actions refused during shutdown");
    describe_counter!("bookings.realtime.events", "Realtime change events, by kind");
    describe_counter!("bookings.writes", "Booking writes, by operation and outcome");
}
