//! Tracing setup. Logs go to stderr so stdout stays machine-readable.

use studytime_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `STUDYTIME_LOG` wins, then `log.filter` from the config file.
pub fn init() {
    let configured = Config::load_or_default().log.filter;
    let env_filter = EnvFilter::try_from_env("STUDYTIME_LOG")
        .or_else(|_| EnvFilter::try_new(&configured))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
