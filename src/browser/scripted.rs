use crate::browser::{BrowserSession, Navigation, PageSnapshot, SessionError};
use crate::config::MarkupConfig;
use crate::render::{PrintLayout, PrintPreparation};
use crate::url::{canonical_url, CanonicalUrl};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BLANK_PAGE: &str = "<html><head></head><body></body></html>";
const DEFAULT_PRINT_SIZE: usize = 4096;

/// Something the scripted session was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Navigated(String),
    RevealedSection(String),
    Printed { url: String, path: PathBuf },
}

/// A browser session that serves canned pages from memory
///
/// Pages are keyed by canonical URL, so fragments never matter. Revealing a
/// section swaps the current DOM for a registered "after" version. Prints
/// write placeholder bytes whose size is configurable per page.
#[derive(Debug)]
pub struct ScriptedSession {
    pages: HashMap<CanonicalUrl, String>,
    revealed: HashMap<(CanonicalUrl, String), String>,
    navigation_failures: HashMap<CanonicalUrl, u32>,
    timeouts: HashSet<CanonicalUrl>,
    blank_prints: HashMap<CanonicalUrl, u32>,
    print_size: usize,
    current_url: String,
    current_html: String,
    events: Vec<SessionEvent>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            revealed: HashMap::new(),
            navigation_failures: HashMap::new(),
            timeouts: HashSet::new(),
            blank_prints: HashMap::new(),
            print_size: DEFAULT_PRINT_SIZE,
            current_url: "about:blank".to_string(),
            current_html: BLANK_PAGE.to_string(),
            events: Vec::new(),
        }
    }

    /// Serves `html` at `url`
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(canonical_url(url), html.into());
        self
    }

    /// Replaces the DOM of `url` with `html` once section `title` is revealed there
    pub fn with_revealed_section(mut self, url: &str, title: &str, html: impl Into<String>) -> Self {
        self.revealed
            .insert((canonical_url(url), title.to_string()), html.into());
        self
    }

    /// Fails the next `times` navigations to `url`
    pub fn failing_navigation(mut self, url: &str, times: u32) -> Self {
        self.navigation_failures.insert(canonical_url(url), times);
        self
    }

    /// Every navigation to `url` loads but reports a timeout
    pub fn timing_out(mut self, url: &str) -> Self {
        self.timeouts.insert(canonical_url(url));
        self
    }

    /// The next `times` prints of `url` write an empty file
    pub fn blank_prints(mut self, url: &str, times: u32) -> Self {
        self.blank_prints.insert(canonical_url(url), times);
        self
    }

    /// Bytes written by a normal print
    pub fn with_print_size(mut self, bytes: usize) -> Self {
        self.print_size = bytes;
        self
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Canonical URLs printed, in print order
    pub fn printed_urls(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Printed { url, .. } => Some(canonical_url(url).to_string()),
                _ => None,
            })
            .collect()
    }

    /// Paths printed, in print order
    pub fn printed_paths(&self) -> Vec<PathBuf> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Printed { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn print_count(&self, url: &str) -> usize {
        let wanted = canonical_url(url).to_string();
        self.printed_urls().iter().filter(|u| **u == wanted).count()
    }

    pub fn reveal_count(&self, title: &str) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, SessionEvent::RevealedSection(t) if t == title))
            .count()
    }

    fn consume(counter: &mut HashMap<CanonicalUrl, u32>, key: &CanonicalUrl) -> bool {
        match counter.get_mut(key) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<Navigation, SessionError> {
        self.events.push(SessionEvent::Navigated(url.to_string()));
        let key = canonical_url(url);

        if Self::consume(&mut self.navigation_failures, &key) {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                message: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }

        self.current_url = url.to_string();
        self.current_html = self
            .pages
            .get(&key)
            .cloned()
            .unwrap_or_else(|| BLANK_PAGE.to_string());

        if self.timeouts.contains(&key) {
            Ok(Navigation::TimedOut)
        } else {
            Ok(Navigation::Loaded)
        }
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError> {
        Ok(PageSnapshot {
            url: self.current_url.clone(),
            html: self.current_html.clone(),
        })
    }

    async fn reveal_section(
        &mut self,
        title: &str,
        _markup: &MarkupConfig,
    ) -> Result<bool, SessionError> {
        self.events
            .push(SessionEvent::RevealedSection(title.to_string()));
        let key = (canonical_url(&self.current_url), title.to_string());
        match self.revealed.get(&key) {
            Some(html) => {
                self.current_html = html.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reveal_all_sections(&mut self, _markup: &MarkupConfig) -> Result<(), SessionError> {
        Ok(())
    }

    async fn annotate_geometry(&mut self, _markup: &MarkupConfig) -> Result<(), SessionError> {
        // Fixtures carry their geometry attributes inline
        Ok(())
    }

    async fn prepare_for_print(
        &mut self,
        _preparation: &PrintPreparation<'_>,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn print_pdf(
        &mut self,
        destination: &Path,
        _layout: &PrintLayout,
    ) -> Result<u64, SessionError> {
        let key = canonical_url(&self.current_url);
        let size = if Self::consume(&mut self.blank_prints, &key) {
            0
        } else {
            self.print_size
        };

        tokio::fs::write(destination, vec![b'%'; size]).await?;
        self.events.push(SessionEvent::Printed {
            url: self.current_url.clone(),
            path: destination.to_path_buf(),
        });
        Ok(size as u64)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}
