//! dir-sizer - Bounded-Concurrency Tree Sizing
//!
//! Entry point for the stress binary. Builds a synthetic tree, sizes it and
//! prints the totals.

use anyhow::{bail, Context, Result};
use clap::Parser;
use dir_sizer::config::{CliArgs, SizerConfig};
use dir_sizer::error::NodeError;
use dir_sizer::fixture::{Fault, ListingProbe};
use dir_sizer::summary::{print_header, print_summary};
use dir_sizer::DirSizer;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let config = SizerConfig::from_args(&args).context("Invalid configuration")?;
    let shape = args.tree_shape().context("Invalid tree shape")?;
    let sizer = DirSizer::new(config).context("Failed to initialize sizer")?;

    let probe = ListingProbe::new();
    let mut root = shape.build().with_latency(args.latency()).instrument(&probe);

    if let Some(path) = &args.fail_path {
        let fault = Fault::Fail(NodeError::PermissionDenied { path: path.clone() });
        if !root.inject_fault(path, fault) {
            bail!("No node at fail path '{}'", path);
        }
        info!(path = %path, "Injected listing failure");
    }

    let workers = sizer.config().effective_workers();
    if !args.quiet {
        print_header(
            "/",
            workers,
            shape.dir_count().unwrap_or(u64::MAX),
            args.latency(),
        );
    }

    // First interrupt cancels the run, second one exits immediately
    let cancel = CancellationToken::new();
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            if interrupted.swap(true, Ordering::SeqCst) {
                std::process::exit(130);
            }
            eprintln!("\nInterrupt received, cancelling...");
            cancel.cancel();
        })
        .context("Failed to set signal handler")?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    let start = Instant::now();
    let result = runtime
        .block_on(sizer.size(&cancel, Arc::new(root)))
        .context("Sizing failed")?;
    let duration = start.elapsed();

    if result != shape.expected() {
        warn!(
            got_size = result.size,
            want_size = shape.expected().size,
            "Totals differ from the generated tree"
        );
    }

    if !args.quiet {
        print_summary(&result, duration, workers, probe.peak_listings());
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("dir_sizer=debug,warn")
    } else {
        EnvFilter::new("dir_sizer=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
