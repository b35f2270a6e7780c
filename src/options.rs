use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Configuration;
use crate::error::ConfigError;
use crate::source::SourceSink;
use crate::value::{decode_float, decode_name, decode_uint, split_fields};

pub const VERSION_TEXT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    " ",
    env!("CARGO_PKG_VERSION"),
    "\nAuthored by ",
    env!("CARGO_PKG_AUTHORS"),
    ".\nThis software is not yet released."
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub x: u64,
    pub y: u64,
}

fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    const EXPECTED: &str = "expected X,Y where X and Y are non-negative integers";
    let [x, y] = split_fields::<2>(s).ok_or_else(|| EXPECTED.to_string())?;
    let x = decode_uint(x).map_err(|e| format!("{}: {}", EXPECTED, e))?;
    let y = decode_uint(y).map_err(|e| format!("{}: {}", EXPECTED, e))?;
    Ok(Dimensions { x, y })
}

fn parse_source_sink(s: &str) -> Result<SourceSink, String> {
    s.parse()
}

/// Jacobi solver harness: parses and validates the solver configuration.
#[derive(Debug, Parser)]
#[command(name = "jacobi")]
#[command(about = "Configuration front-end for the Jacobi solver harness")]
#[command(before_help = "Welcome to the Jacobi solver harness!")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_override_self = true)]
pub struct Cli {
    /// Surface dimensions in the form --XY=x,y. Default is 100x100
    #[arg(
        long = "XY",
        value_name = "X,Y",
        value_parser = parse_dimensions,
        allow_hyphen_values = true
    )]
    pub xy: Option<Dimensions>,

    /// Surface width
    #[arg(
        short = 'x',
        value_name = "X",
        value_parser = decode_uint::<u64>,
        allow_hyphen_values = true
    )]
    pub x: Option<u64>,

    /// Surface height
    #[arg(
        short = 'y',
        value_name = "Y",
        value_parser = decode_uint::<u64>,
        allow_hyphen_values = true
    )]
    pub y: Option<u64>,

    /// Number of threads to use. Default is 1
    #[arg(
        short = 'n',
        long,
        value_name = "N",
        value_parser = decode_uint::<u64>,
        allow_hyphen_values = true
    )]
    pub threads: Option<u64>,

    /// xy-location and fixed value, e.g. --source=200,300,100.0 (repeatable, --sink is identical)
    #[arg(
        short = 's',
        long = "source",
        visible_alias = "sink",
        visible_short_alias = 'S',
        value_name = "X,Y,TEMP",
        value_parser = parse_source_sink,
        allow_hyphen_values = true
    )]
    pub sources: Vec<SourceSink>,

    /// Halt when the maximum difference between timesteps is below this value. Default is 0.001
    #[arg(
        short = 'd',
        long,
        value_name = "DELTA",
        value_parser = decode_float,
        allow_hyphen_values = true
    )]
    pub delta: Option<f64>,

    /// Dump the final state of the field to this file. Default is Jacobi.out
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        value_parser = decode_name,
        allow_hyphen_values = true
    )]
    pub output: Option<String>,

    /// Select which algorithm to run. Default is "naive"
    #[arg(
        short = 'k',
        long,
        value_name = "NAME",
        value_parser = decode_name,
        allow_hyphen_values = true
    )]
    pub kernel: Option<String>,

    /// Width of the margin kept at a constant temperature. Default is 2
    #[arg(
        short = 'b',
        long,
        value_name = "CELLS",
        value_parser = decode_uint::<u32>,
        allow_hyphen_values = true
    )]
    pub bathsize: Option<u32>,

    /// Static temperature of the surrounding bath. Default is 0.0
    #[arg(
        short = 'c',
        long,
        value_name = "TEMP",
        value_parser = decode_float,
        allow_hyphen_values = true
    )]
    pub bathtemp: Option<f64>,

    /// Generate a report (number of timesteps, timing info, etc.)
    #[arg(short = 'r', long)]
    pub report: bool,

    /// Generate verbose output helpful for debugging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Initialize non-source, non-sink space to random numbers instead of 0.0
    #[arg(short = 'z', long)]
    pub random: bool,

    /// Print parameter values, attempt to allocate the requested memory and exit
    #[arg(short = 'D', long)]
    pub dryrun: bool,

    /// Read defaults from a TOML file; command-line options take precedence
    #[arg(long, value_name = "FILE", allow_hyphen_values = true)]
    pub config: Option<PathBuf>,
}

/// Surface size requested on the command line, after `--XY`, `-x` and `-y`
/// have been applied in the order they appeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceOverride {
    pub x: Option<u64>,
    pub y: Option<u64>,
}

impl SurfaceOverride {
    fn from_matches(cli: &Cli, matches: &ArgMatches) -> Self {
        let mut edits: Vec<(usize, Self)> = Vec::with_capacity(3);
        if let (Some(d), Some(at)) = (cli.xy, matches.index_of("xy")) {
            edits.push((at, Self { x: Some(d.x), y: Some(d.y) }));
        }
        if let (Some(x), Some(at)) = (cli.x, matches.index_of("x")) {
            edits.push((at, Self { x: Some(x), y: None }));
        }
        if let (Some(y), Some(at)) = (cli.y, matches.index_of("y")) {
            edits.push((at, Self { x: None, y: Some(y) }));
        }
        edits.sort_by_key(|(at, _)| *at);
        edits
            .into_iter()
            .fold(Self::default(), |acc, (_, edit)| Self {
                x: edit.x.or(acc.x),
                y: edit.y.or(acc.y),
            })
    }
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Run(Configuration),
    Help(String),
    Version(&'static str),
}

/// Parse a full argument vector (program name first) into an [`Invocation`].
///
/// Help and version stop parsing where they appear, before any file is read
/// or any source is bounds-checked. Everything else is decoded, layered over the defaults and
/// validated as a whole once the last argument has been consumed.
pub fn parse_options<I, T>(args: I) -> Result<Invocation, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match Cli::command().try_get_matches_from(args) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            return Ok(Invocation::Help(e.render().to_string()));
        }
        Err(e) if e.kind() == ErrorKind::DisplayVersion => {
            return Ok(Invocation::Version(VERSION_TEXT));
        }
        Err(e) => return Err(e.into()),
    };
    let cli = Cli::from_arg_matches(&matches)?;

    let surface = SurfaceOverride::from_matches(&cli, &matches);
    Configuration::resolve(&cli, surface).map(Invocation::Run)
}
