use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt as _};

/// Installs the global tracing subscriber. Production deployments get flat
/// JSON lines, everything else gets the pretty human-readable format.
pub fn init_tracing(prod_format: bool) {
    let filter = EnvFilter::from_default_env();

    if prod_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true).with_ansi(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_ansi(true))
            .init();
    }
}
