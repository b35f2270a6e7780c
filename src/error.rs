use clap::error::ErrorKind;
use std::collections::TryReserveError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit status for every fatal configuration error (255 on Unix).
pub const EXIT_FAILURE: i32 = -1;

/// Coarse classification of a [`ConfigError`], stable enough for tests and
/// callers to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    MalformedValue,
    MissingValue,
    UnrecognizedOption,
    ConfigFile,
    Allocation,
    OutOfBounds,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tokenizer or value decoding failure reported by clap.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("failed to read config file {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{field}' in config file {}: {reason}", .path.display())]
    FileValue {
        path: PathBuf,
        field: &'static str,
        reason: String,
    },

    #[error("error allocating memory for the source/sink list: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("source/sink out of bounds at x={x} y={y}, boundaries are X={max_x} and Y={max_y}")]
    OutOfBounds { x: u64, y: u64, max_x: u64, max_y: u64 },
}

impl ConfigError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Cli(e) => match e.kind() {
                ErrorKind::InvalidValue | ErrorKind::NoEquals | ErrorKind::TooFewValues => {
                    FailureKind::MissingValue
                }
                ErrorKind::UnknownArgument | ErrorKind::InvalidSubcommand => {
                    FailureKind::UnrecognizedOption
                }
                _ => FailureKind::MalformedValue,
            },
            Self::ReadFile { .. } | Self::ParseFile { .. } | Self::FileValue { .. } => {
                FailureKind::ConfigFile
            }
            Self::Allocation(_) => FailureKind::Allocation,
            Self::OutOfBounds { .. } => FailureKind::OutOfBounds,
        }
    }

    pub const fn exit_code(&self) -> i32 {
        EXIT_FAILURE
    }

    /// Write the diagnostic to stderr. Clap errors keep their own layout
    /// (message, usage line, `--help` hint).
    pub fn print(&self) {
        match self {
            Self::Cli(e) => {
                // stderr write failures are dropped, as `clap::Error::exit` does
                let _ = e.print();
            }
            other => eprintln!("error: {}", other),
        }
    }
}
