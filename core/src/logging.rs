use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the compact stderr subscriber used by the `lumi` binary.
/// `RUST_LOG` overrides the crate default.
pub fn init_cli_logger(verbose: bool) {
    let default = if verbose {
        "lumi_core=debug,info"
    } else {
        "lumi_core=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
