//! Browser session abstraction
//!
//! The crawl talks to exactly one live page through the [`BrowserSession`]
//! trait. Every call is a blocking round-trip that completes before the next
//! tree-walk step. Two implementations exist:
//!
//! - [`ChromeSession`]: a headless Chrome page driven over CDP
//! - [`ScriptedSession`]: canned pages held in memory, for offline runs and tests

mod chrome;
mod scripted;
mod scripts;

pub use chrome::ChromeSession;
pub use scripted::{ScriptedSession, SessionEvent};

use crate::config::MarkupConfig;
use crate::render::{PrintLayout, PrintPreparation};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Attribute stamped on navigation anchors with their on-screen left offset (px)
pub const LEFT_OFFSET_ATTRIBUTE: &str = "data-navpress-left";

/// Attribute stamped on navigation anchors that are not rendered
pub const HIDDEN_ATTRIBUTE: &str = "data-navpress-hidden";

/// Errors raised by a browser session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Navigation to {url} timed out")]
    NavigationTimeout { url: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Failed to print {path}: {message}")]
    Print { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a navigation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Loaded,
    /// The load did not settle in time; the DOM holds whatever arrived
    TimedOut,
}

/// The current page's URL and serialized DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
}

/// One live page in a browser
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// Navigates the page, waiting at most `timeout` for the load to settle
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, SessionError>;

    /// Captures the current URL and DOM
    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError>;

    /// Clicks the navigation section titled `title` open if it is collapsed
    ///
    /// Returns false when no such section header exists on the page.
    async fn reveal_section(
        &mut self,
        title: &str,
        markup: &MarkupConfig,
    ) -> Result<bool, SessionError>;

    /// Marks every navigation section as open
    async fn reveal_all_sections(&mut self, markup: &MarkupConfig) -> Result<(), SessionError>;

    /// Stamps live geometry onto navigation anchors
    ///
    /// Each anchor under the navigation root receives
    /// [`LEFT_OFFSET_ATTRIBUTE`], and [`HIDDEN_ATTRIBUTE`] when it is not
    /// rendered, so the next snapshot carries what static markup cannot.
    async fn annotate_geometry(&mut self, markup: &MarkupConfig) -> Result<(), SessionError>;

    /// Opens disclosure widgets, injects heading and breadcrumbs, applies the print style
    async fn prepare_for_print(
        &mut self,
        preparation: &PrintPreparation<'_>,
    ) -> Result<(), SessionError>;

    /// Prints the current page to `destination`, returning the bytes written
    async fn print_pdf(
        &mut self,
        destination: &Path,
        layout: &PrintLayout,
    ) -> Result<u64, SessionError>;

    /// Shuts the session down
    async fn close(&mut self) -> Result<(), SessionError>;
}
