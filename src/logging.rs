use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging, filtered by `RUST_LOG` when set.
pub fn init(verbose: bool) {
    let default_level = if verbose { "rtc2tracker=debug" } else { "rtc2tracker=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .init();
}
