//! Configuration types for dir-sizer
//!
//! This module defines:
//! - Runtime configuration for a sizing run, with validation
//! - CLI argument parsing for the stress binary using clap derive macros

use crate::error::ConfigError;
use crate::fixture::TreeShape;
use clap::Parser;
use std::time::Duration;

/// Floor applied to the requested worker bound
pub const MIN_WORKERS: usize = 4;

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Default capacity of the report channel
pub const DEFAULT_REPORT_BUFFER: usize = 1024;

/// Largest synthetic tree the stress binary will build
const MAX_SYNTHETIC_DIRS: u64 = 1_000_000;

/// Validated runtime configuration for a sizing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizerConfig {
    /// Requested number of concurrent listings (clamped to [`MIN_WORKERS`]..=[`MAX_WORKERS`])
    pub max_workers: usize,

    /// Capacity of the channel carrying partial reports to the aggregator
    pub report_buffer: usize,

    /// Optional wall-clock budget for the whole run
    pub deadline: Option<Duration>,
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self {
            max_workers: MIN_WORKERS,
            report_buffer: DEFAULT_REPORT_BUFFER,
            deadline: None,
        }
    }
}

impl SizerConfig {
    /// Configuration with the given worker bound and default everything else
    pub fn with_workers(max_workers: usize) -> Self {
        Self {
            max_workers,
            ..Self::default()
        }
    }

    /// Set the report channel capacity
    pub fn report_buffer(mut self, size: usize) -> Self {
        self.report_buffer = size;
        self
    }

    /// Set a deadline for the whole run
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Number of admission tokens actually used for a run
    ///
    /// Bounds outside `MIN_WORKERS..=MAX_WORKERS` are clamped into it.
    pub fn effective_workers(&self) -> usize {
        self.max_workers.clamp(MIN_WORKERS, MAX_WORKERS)
    }

    /// Validate the configuration
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.report_buffer == 0 {
            return Err(ConfigError::InvalidReportBuffer {
                size: self.report_buffer,
                min: 1,
            });
        }

        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::InvalidDeadline);
        }

        Ok(self)
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        if args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        let mut config = Self::with_workers(args.workers).report_buffer(args.report_buffer);
        if let Some(secs) = args.timeout {
            let deadline =
                Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDeadline)?;
            config = config.deadline(deadline);
        }
        config.validate()
    }
}

/// Size a synthetic directory tree with bounded concurrency
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dir-sizer",
    version,
    about = "Size a synthetic directory tree with bounded concurrency",
    long_about = "Builds an in-memory directory tree of the requested shape and computes its total\n\
                  size and file count, with at most WORKERS listings in flight at once.\n\n\
                  Useful for exercising admission control, fail-fast errors and cancellation.",
    after_help = "EXAMPLES:\n    \
        dir-sizer --depth 3 --breadth 5\n    \
        dir-sizer -w 1 --depth 4 --breadth 8 --latency-ms 2\n    \
        dir-sizer --depth 3 --breadth 5 --fail-path /d1/d3\n    \
        dir-sizer --depth 6 --breadth 6 --latency-ms 5 --timeout 2"
)]
pub struct CliArgs {
    /// Maximum concurrent directory listings (minimum 4 is enforced)
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Levels of sub-directories below the root
    #[arg(short = 'd', long, default_value = "3", value_name = "NUM")]
    pub depth: u32,

    /// Sub-directories per directory
    #[arg(short = 'b', long, default_value = "5", value_name = "NUM")]
    pub breadth: usize,

    /// Files per directory
    #[arg(short = 'f', long, default_value = "10", value_name = "NUM")]
    pub files_per_dir: usize,

    /// Base file size in bytes
    #[arg(long, default_value = "4096", value_name = "BYTES")]
    pub file_size: u64,

    /// Simulated latency of every list and stat call
    #[arg(long, default_value = "0", value_name = "MS")]
    pub latency_ms: u64,

    /// Make the listing of this directory fail (e.g. /d0/d2)
    #[arg(long, value_name = "PATH")]
    pub fail_path: Option<String>,

    /// Abort the run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Report channel capacity
    #[arg(long, default_value_t = DEFAULT_REPORT_BUFFER, value_name = "NUM")]
    pub report_buffer: usize,

    /// Quiet mode - suppress header and summary
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (per-directory debug logs)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Tree shape described by the arguments, rejecting trees too large to build
    pub fn tree_shape(&self) -> Result<TreeShape, ConfigError> {
        let shape = TreeShape {
            depth: self.depth,
            breadth: self.breadth,
            files_per_dir: self.files_per_dir,
            file_size: self.file_size,
        };

        match shape.dir_count() {
            Some(dirs) if dirs <= MAX_SYNTHETIC_DIRS => Ok(shape),
            dirs => Err(ConfigError::TreeTooLarge {
                dirs: dirs.unwrap_or(u64::MAX),
                max: MAX_SYNTHETIC_DIRS,
            }),
        }
    }

    /// Simulated per-call latency
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

fn default_workers() -> usize {
    // Node calls are I/O bound, so oversubscribe the cores
    (num_cpus::get() * 2).min(MAX_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_workers_floor() {
        assert_eq!(SizerConfig::with_workers(0).effective_workers(), MIN_WORKERS);
        assert_eq!(SizerConfig::with_workers(1).effective_workers(), MIN_WORKERS);
        assert_eq!(SizerConfig::with_workers(4).effective_workers(), 4);
        assert_eq!(SizerConfig::with_workers(32).effective_workers(), 32);
        assert_eq!(SizerConfig::with_workers(MAX_WORKERS).effective_workers(), MAX_WORKERS);
        assert_eq!(SizerConfig::with_workers(100_000).effective_workers(), MAX_WORKERS);
    }

    #[test]
    fn test_validate() {
        assert!(SizerConfig::default().validate().is_ok());
        assert!(SizerConfig::with_workers(0).validate().is_ok());

        assert!(SizerConfig::with_workers(MAX_WORKERS + 1).validate().is_ok());
        assert!(matches!(
            SizerConfig::default().report_buffer(0).validate(),
            Err(ConfigError::InvalidReportBuffer { .. })
        ));
        assert_eq!(
            SizerConfig::default().deadline(Duration::ZERO).validate(),
            Err(ConfigError::InvalidDeadline)
        );
    }

    #[test]
    fn test_from_args() {
        let args = CliArgs::parse_from(["dir-sizer", "-w", "2", "--timeout", "1.5"]);
        let config = SizerConfig::from_args(&args).unwrap();
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.effective_workers(), MIN_WORKERS);
        assert_eq!(config.deadline, Some(Duration::from_millis(1500)));
        assert_eq!(config.report_buffer, DEFAULT_REPORT_BUFFER);

        let too_many = CliArgs::parse_from(["dir-sizer", "-w", "1000"]);
        assert_eq!(
            SizerConfig::from_args(&too_many),
            Err(ConfigError::InvalidWorkerCount {
                count: 1000,
                max: MAX_WORKERS
            })
        );

        let negative = CliArgs::parse_from(["dir-sizer", "--timeout=-1"]);
        assert_eq!(
            SizerConfig::from_args(&negative),
            Err(ConfigError::InvalidDeadline)
        );
    }

    #[test]
    fn test_tree_shape_limit() {
        let args = CliArgs::parse_from(["dir-sizer", "--depth", "2", "--breadth", "3"]);
        let shape = args.tree_shape().unwrap();
        assert_eq!(shape.dir_count(), Some(1 + 3 + 9));

        let huge = CliArgs::parse_from(["dir-sizer", "--depth", "20", "--breadth", "10"]);
        assert!(matches!(
            huge.tree_shape(),
            Err(ConfigError::TreeTooLarge { .. })
        ));
    }
}
