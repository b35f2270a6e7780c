use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::options::{Cli, SurfaceOverride};
use crate::source::SourceSink;
use crate::value::{check_finite, check_name};

pub const DEFAULT_X: u64 = 100;
pub const DEFAULT_Y: u64 = 100;
pub const DEFAULT_THREADS: u64 = 1;
pub const DEFAULT_DELTA: f64 = 0.001;
pub const DEFAULT_OUTPUT: &str = "Jacobi.out";
pub const DEFAULT_KERNEL: &str = "naive";
pub const DEFAULT_BATHSIZE: u32 = 2;
pub const DEFAULT_BATHTEMP: f64 = 0.0;

/// Contents of a `--config` TOML file. Every section is optional and falls
/// back to the built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub surface: SurfaceConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default, rename = "source")]
    pub sources: Vec<SourceSink>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    pub x: u64,
    pub y: u64,
    pub bathsize: u32,
    pub bathtemp: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            x: DEFAULT_X,
            y: DEFAULT_Y,
            bathsize: DEFAULT_BATHSIZE,
            bathtemp: DEFAULT_BATHTEMP,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    pub threads: u64,
    pub delta: f64,
    pub kernel: String,
    pub random: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            delta: DEFAULT_DELTA,
            kernel: DEFAULT_KERNEL.to_string(),
            random: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: String,
    pub report: bool,
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_OUTPUT.to_string(),
            report: false,
            verbose: false,
        }
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = toml::from_str::<FileConfig>(&contents).map_err(|source| {
            ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            }
        })?;
        cfg.check(path)?;
        tracing::debug!(path = %path.display(), sources = cfg.sources.len(), "loaded config file");
        Ok(cfg)
    }

    /// Apply the same value rules the command line enforces.
    fn check(&self, path: &Path) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: String| ConfigError::FileValue {
            path: path.to_path_buf(),
            field,
            reason,
        };
        check_finite(self.surface.bathtemp).map_err(|r| invalid("surface.bathtemp", r))?;
        check_finite(self.solver.delta).map_err(|r| invalid("solver.delta", r))?;
        check_name(&self.solver.kernel).map_err(|r| invalid("solver.kernel", r))?;
        check_name(&self.output.path).map_err(|r| invalid("output.path", r))?;
        for source in &self.sources {
            source.check().map_err(|r| invalid("source.temp", r))?;
        }
        Ok(())
    }
}

/// Validated solver setup handed to the solver entry point.
///
/// Built only through [`Configuration::resolve`], so every instance has all
/// sources inside the surface. Fields are read-only from outside this module.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    x: u64,
    y: u64,
    threads: u64,
    sources: Vec<SourceSink>,
    target_delta: f64,
    output: PathBuf,
    kernel: String,
    bathsize: u32,
    bathtemp: f64,
    debug: bool,
    report: bool,
    random: bool,
    dryrun: bool,
}

impl Configuration {
    /// Build the final config: defaults -> file values -> CLI overrides, then
    /// bounds-check the sources against the final surface.
    pub fn resolve(cli: &Cli, surface: SurfaceOverride) -> Result<Self, ConfigError> {
        let mut file_cfg = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        // CLI overrides
        if let Some(x) = surface.x {
            file_cfg.surface.x = x;
        }
        if let Some(y) = surface.y {
            file_cfg.surface.y = y;
        }
        if let Some(v) = cli.threads {
            file_cfg.solver.threads = v;
        }
        if let Some(v) = cli.delta {
            file_cfg.solver.delta = v;
        }
        if let Some(ref v) = cli.output {
            file_cfg.output.path = v.clone();
        }
        if let Some(ref v) = cli.kernel {
            file_cfg.solver.kernel = v.clone();
        }
        if let Some(v) = cli.bathsize {
            file_cfg.surface.bathsize = v;
        }
        if let Some(v) = cli.bathtemp {
            file_cfg.surface.bathtemp = v;
        }

        // Best effort: clap has already grown `cli.sources` infallibly, so this
        // only catches failure when merging with the file's entries.
        let mut sources: Vec<SourceSink> = Vec::new();
        sources.try_reserve_exact(file_cfg.sources.len() + cli.sources.len())?;
        sources.extend_from_slice(&file_cfg.sources);
        sources.extend_from_slice(&cli.sources);

        let cfg = Self {
            x: file_cfg.surface.x,
            y: file_cfg.surface.y,
            threads: file_cfg.solver.threads,
            sources,
            target_delta: file_cfg.solver.delta,
            output: PathBuf::from(file_cfg.output.path),
            kernel: file_cfg.solver.kernel,
            bathsize: file_cfg.surface.bathsize,
            bathtemp: file_cfg.surface.bathtemp,
            debug: cli.verbose || file_cfg.output.verbose,
            report: cli.report || file_cfg.output.report,
            random: cli.random || file_cfg.solver.random,
            dryrun: cli.dryrun,
        };
        cfg.sanity_check()?;
        tracing::debug!(
            x = cfg.x,
            y = cfg.y,
            sources = cfg.sources.len(),
            kernel = %cfg.kernel,
            "configuration validated"
        );
        Ok(cfg)
    }

    /// Fails on the first source/sink outside `[0, X) x [0, Y)`.
    fn sanity_check(&self) -> Result<(), ConfigError> {
        match self.sources.iter().find(|s| !s.within(self.x, self.y)) {
            Some(s) => Err(ConfigError::OutOfBounds {
                x: s.x,
                y: s.y,
                max_x: self.x,
                max_y: self.y,
            }),
            None => Ok(()),
        }
    }

    pub fn x(&self) -> u64 {
        self.x
    }

    pub fn y(&self) -> u64 {
        self.y
    }

    pub fn threads(&self) -> u64 {
        self.threads
    }

    /// Sources and sinks in command-line order, file entries first.
    pub fn sources(&self) -> &[SourceSink] {
        &self.sources
    }

    pub fn target_delta(&self) -> f64 {
        self.target_delta
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn kernel(&self) -> &str {
        &self.kernel
    }

    pub fn bathsize(&self) -> u32 {
        self.bathsize
    }

    pub fn bathtemp(&self) -> f64 {
        self.bathtemp
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn report(&self) -> bool {
        self.report
    }

    pub fn random(&self) -> bool {
        self.random
    }

    pub fn dryrun(&self) -> bool {
        self.dryrun
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::options::{parse_options, Invocation};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn resolve(args: &[&str]) -> Result<Configuration, ConfigError> {
        let argv = std::iter::once("jacobi").chain(args.iter().copied());
        match parse_options(argv)? {
            Invocation::Run(cfg) => Ok(cfg),
            other => panic!("expected a configuration, got {:?}", other),
        }
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file should be created");
        file.write_all(contents.as_bytes())
            .expect("temp file should be writable");
        file
    }

    #[test]
    fn defaults_when_no_options() {
        let cfg = resolve(&[]).unwrap();
        assert_eq!(cfg.x(), 100);
        assert_eq!(cfg.y(), 100);
        assert_eq!(cfg.threads(), 1);
        assert_eq!(cfg.target_delta(), 0.001);
        assert_eq!(cfg.output(), Path::new("Jacobi.out"));
        assert_eq!(cfg.kernel(), "naive");
        assert_eq!(cfg.bathsize(), 2);
        assert_eq!(cfg.bathtemp(), 0.0);
        assert!(!cfg.debug() && !cfg.report() && !cfg.random() && !cfg.dryrun());
        assert!(cfg.sources().is_empty());
    }

    #[test]
    fn sources_may_precede_dimensions() {
        let cfg = resolve(&["--source=150,20,1.0", "--XY=200,50"]).unwrap();
        assert_eq!(cfg.sources(), &[SourceSink::new(150, 20, 1.0)]);
    }

    #[test]
    fn out_of_bounds_source_is_rejected() {
        let err = resolve(&["--XY=10,10", "--source=10,5,1.0"]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfBounds);
        assert_eq!(
            err.to_string(),
            "source/sink out of bounds at x=10 y=5, boundaries are X=10 and Y=10"
        );
    }

    #[test]
    fn first_violation_is_reported() {
        let err = resolve(&[
            "-x", "4", "-y", "4", "-s", "1,1,0", "-S", "2,9,0", "-s", "8,8,0",
        ])
        .unwrap_err();
        match err {
            ConfigError::OutOfBounds { x, y, .. } => assert_eq!((x, y), (2, 9)),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn zero_sized_surface_rejects_every_source() {
        assert!(resolve(&["--XY=0,0"]).is_ok());
        let err = resolve(&["--XY=0,0", "--sink=0,0,1"]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfBounds);
    }

    #[test]
    fn file_values_sit_beneath_cli_values() {
        let file = config_file(
            r#"
[surface]
x = 500
y = 400
bathtemp = 25.0

[solver]
threads = 8
kernel = "blocked"

[output]
report = true

[[source]]
x = 1
y = 2
temp = 100.0
"#,
        );
        let path = file.path().to_str().unwrap();
        let cfg = resolve(&["--config", path, "-y", "300", "-n", "4", "--sink=3,4,-5"]).unwrap();

        assert_eq!((cfg.x(), cfg.y()), (500, 300));
        assert_eq!(cfg.threads(), 4);
        assert_eq!(cfg.kernel(), "blocked");
        assert_eq!(cfg.bathtemp(), 25.0);
        assert_eq!(cfg.bathsize(), 2);
        assert!(cfg.report());
        assert_eq!(
            cfg.sources(),
            &[SourceSink::new(1, 2, 100.0), SourceSink::new(3, 4, -5.0)]
        );
    }

    #[test]
    fn file_sources_are_bounds_checked() {
        let file = config_file("[surface]\nx = 5\ny = 5\n\n[[source]]\nx = 5\ny = 0\ntemp = 1.0\n");
        let path = file.path().to_str().unwrap();
        let err = resolve(&["--config", path]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::OutOfBounds);

        // a larger surface on the command line rescues it
        let cfg = resolve(&["--config", path, "-x", "6"]).unwrap();
        assert_eq!(cfg.sources().len(), 1);
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let file = config_file("[solver]\nthreds = 4\n");
        let path = file.path().to_str().unwrap();
        let err = resolve(&["--config", path]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigFile);
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn blank_file_strings_are_rejected() {
        let file = config_file("[solver]\nkernel = \"\"\n");
        let path = file.path().to_str().unwrap();
        match resolve(&["--config", path]).unwrap_err() {
            ConfigError::FileValue { field, .. } => assert_eq!(field, "solver.kernel"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn negative_file_coordinates_are_rejected() {
        let file = config_file("[[source]]\nx = -1\ny = 0\ntemp = 1.0\n");
        let path = file.path().to_str().unwrap();
        let err = resolve(&["--config", path]).unwrap_err();
        assert_eq!(err.kind(), FailureKind::ConfigFile);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = resolve(&["--config", path.to_str().unwrap()]).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }
}
