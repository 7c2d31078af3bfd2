//! Console output for the stress binary

use crate::sizer::SizeResult;
use console::style;
use humansize::{format_size, BINARY};
use std::time::Duration;

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a header before the run starts
pub fn print_header(root: &str, workers: usize, dirs: u64, latency: Duration) {
    println!();
    println!(
        "{} {}",
        style("dir-sizer").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Root:").bold(), root);
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Tree:").bold(), format_number(dirs));
    if !latency.is_zero() {
        println!(
            "  {} {}ms per call",
            style("Latency:").bold(),
            latency.as_millis()
        );
    }
    println!();
}

/// Print the totals of a completed run
pub fn print_summary(result: &SizeResult, duration: Duration, workers: usize, peak_listings: usize) {
    let duration_secs = duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        result.dirs as f64 / duration_secs
    } else {
        0.0
    };

    println!();
    println!("{}", style("Sizing Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Directories:").bold(),
        format_number(result.dirs)
    );
    println!("  {} {}", style("Files:").bold(), format_number(result.count));
    println!(
        "  {} {} ({} bytes)",
        style("Total Size:").bold(),
        format_size(result.size, BINARY),
        format_number(result.size)
    );
    if result.count > 0 {
        println!(
            "  {} {}",
            style("Average File:").bold(),
            format_size(result.average_size() as u64, BINARY)
        );
    }
    println!(
        "  {} {:.2}s ({:.0} dirs/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );

    let peak = style(format!("{}/{}", peak_listings, workers));
    let peak = if peak_listings > workers {
        peak.red().bold()
    } else {
        peak
    };
    println!("  {} {}", style("Peak Listings:").bold(), peak);
    println!();
}
