use meloconfig::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `host.logger.min_level`. Logs go to stderr so that
/// command output on stdout stays clean.
pub fn init_logging(config: &Config) {
    let min_level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(min_level));

    let enable_console = config.get_log_enable_console().unwrap_or(true);
    let console = enable_console.then(|| {
        fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry().with(filter).with(console).init();
}
