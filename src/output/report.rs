//! Crawl report
//!
//! Counters accumulated by the crawler and printed once the run ends.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// An artifact that still failed after every retry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unrecovered {
    pub path: PathBuf,
    pub url: String,
    pub reason: String,
}

/// Counters for one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Nodes in the initially parsed tree
    pub nodes_detected: usize,

    pub directories_created: usize,
    pub pages_rendered: usize,
    pub duplicates_skipped: usize,
    pub render_failures: usize,

    pub groups_expanded: usize,
    pub expansion_children: usize,
    pub active_children: usize,

    pub verification_failures: usize,
    pub recovered: usize,
    pub unrecovered: Vec<Unrecovered>,
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            nodes_detected: 0,
            directories_created: 0,
            pages_rendered: 0,
            duplicates_skipped: 0,
            render_failures: 0,
            groups_expanded: 0,
            expansion_children: 0,
            active_children: 0,
            verification_failures: 0,
            recovered: 0,
            unrecovered: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Whether every expected artifact exists after verification
    pub fn is_complete(&self) -> bool {
        self.unrecovered.is_empty()
    }
}

/// Prints the report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  Navigation nodes detected: {}", report.nodes_detected);
    println!("  Directories created: {}", report.directories_created);
    println!("  Pages rendered: {}", report.pages_rendered);
    println!("  Duplicates skipped: {}", report.duplicates_skipped);
    println!("  Render failures: {}", report.render_failures);
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("Expansion:");
    println!(
        "  Groups expanded: {} ({} links revealed)",
        report.groups_expanded, report.expansion_children
    );
    println!("  Active descendants adopted: {}", report.active_children);
    println!();

    println!("Integrity:");
    if report.verification_failures == 0 {
        println!("  All expected artifacts present");
    } else {
        println!(
            "  Failed checks: {} (recovered {}, unrecovered {})",
            report.verification_failures,
            report.recovered,
            report.unrecovered.len()
        );
    }
    println!();

    if !report.unrecovered.is_empty() {
        println!("Unrecovered Artifacts ({}):", report.unrecovered.len());
        for failure in &report.unrecovered {
            println!(
                "  - {} <- {} ({})",
                failure.path.display(),
                failure.url,
                failure.reason
            );
        }
        println!();
    }
}
