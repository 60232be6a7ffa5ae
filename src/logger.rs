use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// `RUST_LOG` 优先，否则按 `verbose` 选择 debug 或 info
pub fn init(verbose: bool) {
    let tracing_subscriber = tracing_subscriber::registry();
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber.with(filter).with(fmt).init();
}
