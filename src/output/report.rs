//! Run summary printed at the end of a CLI run

use crate::scout::RunReport;

/// Prints a human-readable summary of `report` to stdout
pub fn print_report(report: &RunReport) {
    let stats = &report.stats;

    println!("=== Search Report ===\n");

    println!("Request:");
    println!("  Site: {}", report.site);
    println!("  Query: {}", report.search_text);
    println!("  Route: {}", report.route);
    println!(
        "  Duration: {:.2}s",
        report.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Extraction:");
    println!("  Elements matched: {}", stats.matched);
    println!("  Accepted: {}", stats.accepted);
    println!("  Rejected: {}", stats.rejected);
    println!("  Failed: {}", stats.failed);
    if stats.cancelled > 0 {
        println!("  Cancelled: {}", stats.cancelled);
    }
    println!();

    match &report.delivery {
        Ok(outcome) => println!(
            "Delivery: {} products accepted by collector (HTTP {})",
            report.batch.len(),
            outcome.status_code
        ),
        Err(e) => println!("Delivery: FAILED ({})", e),
    }
}
