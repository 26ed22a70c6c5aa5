//! Navpress: prints accordion-style documentation sites into ordered PDF trees
//!
//! This crate discovers the side navigation of a JavaScript-rendered
//! documentation site, classifies it into a tree of groups and links, expands
//! lazily loaded sections, and renders every navigable page exactly once into
//! a zero-padded, hierarchically numbered artifact tree that merges in crawl
//! order.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod render;
pub mod tree;
pub mod url;

use thiserror::Error;

/// Main error type for Navpress operations
#[derive(Debug, Error)]
pub enum NavpressError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser session error: {0}")]
    Session(#[from] browser::SessionError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Merge error: {0}")]
    Merge(#[from] output::MergeError),

    #[error("Failed to serialize navigation tree: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error at {path}: {source}")]
    Output {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Navpress operations
pub type Result<T> = std::result::Result<T, NavpressError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use browser::{BrowserSession, ChromeSession, ScriptedSession};
pub use config::Config;
pub use crawler::{run_crawl, CrawlOutcome};
pub use tree::{Node, NodeKind};
pub use url::{canonical_url, CanonicalUrl};
