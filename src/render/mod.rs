//! Page rendering
//!
//! Turns one navigable page into one PDF artifact: navigate, prepare the
//! page for print, print. The renderer owns the print style and layout so the
//! crawler only deals in URLs, titles and destinations.

use crate::browser::{BrowserSession, Navigation, SessionError};
use crate::config::{Config, PaperFormat, PrintConfig};
use crate::ConfigError;
use std::path::Path;
use std::time::Duration;

/// Built-in style that reveals accordion content and hides site chrome
pub const DEFAULT_PRINT_STYLE: &str = include_str!("print.css");

const CM_PER_INCH: f64 = 2.54;

/// What the page needs before it is printed
#[derive(Debug, Clone, Copy)]
pub struct PrintPreparation<'a> {
    /// Heading injected when the page has none of its own
    pub title: &'a str,
    pub style: &'a str,
    pub content_selectors: &'a [String],
    pub heading_selectors: &'a [String],
    pub breadcrumb_selector: &'a str,
}

/// Paper geometry, in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintLayout {
    pub paper_width_in: f64,
    pub paper_height_in: f64,
    pub margin_in: f64,
}

impl PrintLayout {
    pub fn new(paper: PaperFormat, margin_cm: f64) -> Self {
        let (paper_width_in, paper_height_in) = paper.dimensions_in();
        Self {
            paper_width_in,
            paper_height_in,
            margin_in: margin_cm / CM_PER_INCH,
        }
    }
}

impl Default for PrintLayout {
    fn default() -> Self {
        Self::new(PaperFormat::A4, 1.0)
    }
}

/// Renders pages to PDF through a browser session
#[derive(Debug, Clone)]
pub struct PageRenderer {
    style: String,
    print: PrintConfig,
    layout: PrintLayout,
    navigation_timeout: Duration,
}

impl PageRenderer {
    /// Creates a renderer, reading the custom print style if one is configured
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let style = match &config.print.style_file {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_PRINT_STYLE.to_string(),
        };

        Ok(Self {
            style,
            print: config.print.clone(),
            layout: PrintLayout::new(config.print.paper, config.print.margin_cm),
            navigation_timeout: Duration::from_millis(config.browser.navigation_timeout_ms),
        })
    }

    /// Renders `url` to `destination`, returning the bytes written
    ///
    /// A navigation that does not settle in time is a failure here: printing
    /// a half-loaded page would produce an artifact that looks valid.
    pub async fn render<S: BrowserSession>(
        &self,
        session: &mut S,
        url: &str,
        destination: &Path,
        title: &str,
    ) -> Result<u64, SessionError> {
        match session.navigate(url, self.navigation_timeout).await? {
            Navigation::Loaded => {}
            Navigation::TimedOut => {
                return Err(SessionError::NavigationTimeout {
                    url: url.to_string(),
                })
            }
        }

        let preparation = PrintPreparation {
            title,
            style: &self.style,
            content_selectors: &self.print.content_selectors,
            heading_selectors: &self.print.heading_selectors,
            breadcrumb_selector: &self.print.breadcrumb_selector,
        };
        session.prepare_for_print(&preparation).await?;

        let bytes = session.print_pdf(destination, &self.layout).await?;
        tracing::debug!("Printed {} ({} bytes) to {}", url, bytes, destination.display());
        Ok(bytes)
    }
}
