//! Main binary entry point for pg-replicate.

use pg_replicate::args::get_args;
use pg_replicate::{HostSystem, Settings, logging};

fn main() {
    let args = get_args().unwrap_or_else(|err| {
        // Usage errors exit 1; --help and --version keep clap's success exit.
        if err.use_stderr() {
            let _ = err.print();
            std::process::exit(1);
        }
        err.exit()
    });
    logging::init(args.verbose);
    let settings = Settings::from_args(&args);
    if let Err(err) = pg_replicate::run(&settings, &HostSystem, &mut std::io::stdout().lock()) {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
