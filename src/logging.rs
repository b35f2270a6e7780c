use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Handle for raising the log level once `--verbose` has been parsed.
pub struct LogHandle(reload::Handle<EnvFilter, Registry>);

/// Install a stderr subscriber filtered by `RUST_LOG` (default `warn`).
/// Stdout stays free for help, version and dry-run output.
pub fn init() -> LogHandle {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let (filter, handle) = reload::Layer::new(filter);
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
    LogHandle(handle)
}

impl LogHandle {
    pub fn enable_verbose(&self) {
        if let Err(e) = self.0.modify(|filter| *filter = EnvFilter::new("debug")) {
            eprintln!("warning: could not raise log level: {}", e);
        }
    }
}
