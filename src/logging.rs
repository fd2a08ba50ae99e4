use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count. `RUST_LOG` takes precedence when set.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "pg_replicate=info,warn",
        1 => "pg_replicate=debug,info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr so status output on stdout stays clean.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
