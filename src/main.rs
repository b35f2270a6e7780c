mod config;
mod error;
mod logging;
mod options;
mod report;
mod source;
mod value;

use options::Invocation;
use std::io;

fn main() {
    let log = logging::init();

    let cfg = match options::parse_options(std::env::args_os()) {
        Ok(Invocation::Run(cfg)) => cfg,
        Ok(Invocation::Help(text)) => {
            print!("{}", text);
            return;
        }
        Ok(Invocation::Version(text)) => {
            println!("{}", text);
            return;
        }
        Err(e) => {
            tracing::debug!(kind = ?e.kind(), "configuration rejected");
            e.print();
            std::process::exit(e.exit_code());
        }
    };

    if cfg.debug() {
        log.enable_verbose();
    }

    if cfg.dryrun() {
        tracing::debug!(dryrun = cfg.dryrun(), "printing parameters");
        if let Err(e) = report::print_parameters(&mut io::stdout().lock(), &cfg) {
            eprintln!("error: failed to write dry-run report: {}", e);
            std::process::exit(error::EXIT_FAILURE);
        }
        return;
    }

    tracing::info!(
        x = cfg.x(),
        y = cfg.y(),
        threads = cfg.threads(),
        sources = cfg.sources().len(),
        kernel = %cfg.kernel(),
        output = %cfg.output().display(),
        "configuration accepted"
    );
}
