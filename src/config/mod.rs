//! Configuration module for Navpress
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use navpress::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("navpress.toml")).unwrap();
//! println!("Printing {} into {}", config.site.start_url, config.output.directory.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ActiveScopeStrategy, BrowserConfig, Config, CrawlConfig, MarkupConfig, OutputConfig,
    PaperFormat, PrintConfig, SiteConfig, VerifyConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
