use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber and the `log` bridge so the
/// `log::info!`-style calls throughout the pipeline flow into tracing.
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init_tracing_from_env() {
    let _ = tracing_log::LogTracer::init();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
