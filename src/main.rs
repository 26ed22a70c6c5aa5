//! Navpress main entry point
//!
//! This is the command-line interface for the Navpress documentation printer.

use anyhow::Context;
use clap::Parser;
use navpress::browser::{BrowserSession, ChromeSession};
use navpress::config::{load_config_with_hash, Config};
use navpress::crawler::{analyze_sidebar, discover_tree, dump_sidebar, run_crawl};
use navpress::output::{merge_artifacts, print_report};
use navpress::tree::render_preview;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Navpress: prints accordion-navigated documentation to numbered PDFs
///
/// Navpress discovers a documentation site's side navigation, expands its
/// lazily loaded sections, renders every page exactly once into a numbered
/// directory tree, verifies the result, and merges it into one document.
#[derive(Parser, Debug)]
#[command(name = "navpress")]
#[command(version)]
#[command(about = "Prints accordion-navigated documentation to numbered PDFs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the detected hierarchy without printing anything
    #[arg(long, conflicts_with_all = ["merge_only", "analyze", "dump_sidebar"])]
    dry_run: bool,

    /// Merge an existing output directory and exit
    #[arg(long, conflicts_with_all = ["dry_run", "analyze", "dump_sidebar"])]
    merge_only: bool,

    /// Classify a saved sidebar dump offline and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "merge_only", "dump_sidebar"])]
    analyze: Option<PathBuf>,

    /// Save the fully expanded sidebar markup to FILE and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "merge_only", "analyze"])]
    dump_sidebar: Option<PathBuf>,

    /// Skip merging after the crawl
    #[arg(long)]
    no_merge: bool,

    /// Keep the previous contents of the output directory
    #[arg(long)]
    keep_output: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.keep_output {
        config.output.clean = false;
    }

    // Handle different modes
    if let Some(dump) = &cli.analyze {
        handle_analyze(&config, dump)?;
    } else if cli.merge_only {
        handle_merge(&config)?;
    } else if let Some(target) = &cli.dump_sidebar {
        handle_dump_sidebar(&config, target).await?;
    } else if cli.dry_run {
        handle_dry_run(&config).await?;
    } else {
        handle_crawl(&config, !cli.no_merge).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("navpress=info,warn"),
            1 => EnvFilter::new("navpress=debug,info"),
            2 => EnvFilter::new("navpress=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: opens the start page and shows the hierarchy
async fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Navpress Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    match &config.output.merged_file {
        Some(path) => println!("  Merged file: {}", path.display()),
        None => println!("  Merged file: (none)"),
    }
    println!("\nCrawl:");
    println!("  Active scope: {:?}", config.crawl.active_scope);
    println!("  Start page intro: {}", config.crawl.start_page_intro);
    println!();

    let mut session = ChromeSession::launch(&config.browser).await?;
    let result = discover_tree(&mut session, config).await;
    session.close().await?;
    let tree = result?;

    println!("Detected Hierarchy:");
    print!("{}", render_preview(&tree));
    println!(
        "\n✓ Would print {} navigation entries",
        tree.iter().map(|node| node.subtree_len()).sum::<usize>()
    );

    Ok(())
}

/// Handles the --analyze mode: classifies a saved sidebar dump
fn handle_analyze(config: &Config, dump: &Path) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(dump)
        .with_context(|| format!("Failed to read sidebar dump {}", dump.display()))?;
    let base = Url::parse(&config.site.start_url)?;

    let tree = analyze_sidebar(&html, &base, &config.markup);
    println!("=== Sidebar Analysis: {} ===\n", dump.display());
    if tree.is_empty() {
        println!("No navigation root '{}' found", config.markup.root);
    } else {
        print!("{}", render_preview(&tree));
    }

    Ok(())
}

/// Handles the --dump-sidebar mode: saves the expanded navigation markup
async fn handle_dump_sidebar(config: &Config, target: &Path) -> anyhow::Result<()> {
    let mut session = ChromeSession::launch(&config.browser).await?;
    let result = dump_sidebar(&mut session, config, target).await;
    session.close().await?;

    let bytes = result?;
    println!("✓ Saved {} bytes of sidebar markup to {}", bytes, target.display());
    Ok(())
}

/// Handles the --merge-only mode: merges an existing output directory
fn handle_merge(config: &Config) -> anyhow::Result<()> {
    let Some(merged) = &config.output.merged_file else {
        anyhow::bail!("No [output] merged-file configured");
    };

    let report = merge_artifacts(&config.output.directory, merged)?;
    println!(
        "✓ Merged {} artifacts ({} pages) into {}",
        report.merged,
        report.pages,
        merged.display()
    );
    if !report.skipped.is_empty() {
        println!("  Skipped {} unreadable artifacts", report.skipped.len());
    }
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, merge: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Printing {} into {}",
        config.site.start_url,
        config.output.directory.display()
    );

    let mut session = ChromeSession::launch(&config.browser).await?;
    let result = run_crawl(&mut session, config).await;
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if merge && config.output.merged_file.is_some() {
        handle_merge(config)?;
    }

    print_report(&outcome.report);
    Ok(())
}
