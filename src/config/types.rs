use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Navpress
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
    #[serde(default)]
    pub print: PrintConfig,
}

/// The documentation site being printed
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Page whose side navigation is parsed into the initial tree
    #[serde(rename = "start-url")]
    pub start_url: String,
}

/// Where artifacts and side files are written
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory of the artifact tree
    pub directory: PathBuf,

    /// Combined document written after the crawl; merging is skipped when absent
    #[serde(rename = "merged-file", default)]
    pub merged_file: Option<PathBuf>,

    /// Indented log of created segments, appended to during the walk
    #[serde(rename = "hierarchy-log", default = "default_hierarchy_log")]
    pub hierarchy_log: PathBuf,

    /// JSON dump of the initially parsed tree
    #[serde(rename = "debug-tree", default = "default_debug_tree")]
    pub debug_tree: PathBuf,

    /// Remove the artifact directory before crawling
    #[serde(default = "default_true")]
    pub clean: bool,
}

/// Headless browser session settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,

    /// Chrome/Chromium binary; auto-detected when absent
    pub executable: Option<PathBuf>,

    #[serde(rename = "navigation-timeout-ms")]
    pub navigation_timeout_ms: u64,

    /// Bounded wait for lazily revealed content to contain a link
    #[serde(rename = "expansion-timeout-ms")]
    pub expansion_timeout_ms: u64,

    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            navigation_timeout_ms: 60_000,
            expansion_timeout_ms: 5_000,
            poll_interval_ms: 250,
            window_width: 1280,
            window_height: 1024,
        }
    }
}

/// How lazy folders locate children on their own landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveScopeStrategy {
    /// Enclosing section first, indentation-relative siblings as fallback
    #[default]
    EnclosingSection,
    /// Promoted section header first, then indentation-relative siblings
    Indentation,
}

/// Crawl orchestration settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Render the start page as the introduction of the first root group
    #[serde(rename = "start-page-intro")]
    pub start_page_intro: bool,

    #[serde(rename = "active-scope")]
    pub active_scope: ActiveScopeStrategy,

    /// Minimum extra horizontal offset (px) for a link to count as nested
    #[serde(rename = "indent-tolerance-px")]
    pub indent_tolerance_px: f64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_page_intro: false,
            active_scope: ActiveScopeStrategy::default(),
            indent_tolerance_px: 2.0,
        }
    }
}

/// Post-crawl integrity check settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Artifacts smaller than this are treated as failed renders
    #[serde(rename = "min-artifact-bytes")]
    pub min_artifact_bytes: u64,

    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Delay before the first retry; doubled for each further attempt
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            min_artifact_bytes: 1000,
            retry_attempts: 1,
            retry_backoff_ms: 0,
        }
    }
}

/// Class and attribute vocabulary of the side navigation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// CSS selector of the navigation container
    pub root: String,

    #[serde(rename = "section-class")]
    pub section_class: String,

    #[serde(rename = "title-class")]
    pub title_class: String,

    #[serde(rename = "content-class")]
    pub content_class: String,

    #[serde(rename = "active-class")]
    pub active_class: String,

    #[serde(rename = "collapsed-attribute")]
    pub collapsed_attribute: String,

    #[serde(rename = "collapsed-icon-class")]
    pub collapsed_icon_class: String,

    /// Attribute marking a section whose content is fetched on demand
    #[serde(rename = "deferred-attribute")]
    pub deferred_attribute: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            root: "aside.js-accordion".to_string(),
            section_class: "accordion-section".to_string(),
            title_class: "accordion-title".to_string(),
            content_class: "accordion-content".to_string(),
            active_class: "is-active".to_string(),
            collapsed_attribute: "data-collapsed".to_string(),
            collapsed_icon_class: "icon-ui-right".to_string(),
            deferred_attribute: "data-url".to_string(),
        }
    }
}

/// Paper size of printed artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperFormat {
    #[default]
    A4,
    Letter,
}

impl PaperFormat {
    /// Paper width and height in inches
    pub fn dimensions_in(&self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.69),
            Self::Letter => (8.5, 11.0),
        }
    }
}

/// Page preparation and print layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrintConfig {
    pub paper: PaperFormat,

    #[serde(rename = "margin-cm")]
    pub margin_cm: f64,

    /// CSS file replacing the built-in chrome-suppression style
    #[serde(rename = "style-file")]
    pub style_file: Option<PathBuf>,

    /// Candidates for the main content container, first match wins
    #[serde(rename = "content-selectors")]
    pub content_selectors: Vec<String>,

    /// Candidates for the page's own primary heading, first match wins
    #[serde(rename = "heading-selectors")]
    pub heading_selectors: Vec<String>,

    #[serde(rename = "breadcrumb-selector")]
    pub breadcrumb_selector: String,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            paper: PaperFormat::default(),
            margin_cm: 1.0,
            style_file: None,
            content_selectors: vec![
                "div[role=\"main\"]".to_string(),
                ".column-19".to_string(),
                ".column-17".to_string(),
                "main".to_string(),
            ],
            heading_selectors: vec!["header.trailer-1 h1".to_string(), "h1".to_string()],
            breadcrumb_selector: "nav.breadcrumbs".to_string(),
        }
    }
}

fn default_hierarchy_log() -> PathBuf {
    PathBuf::from("hierarchy.txt")
}

fn default_debug_tree() -> PathBuf {
    PathBuf::from("sidebar_debug.json")
}

fn default_true() -> bool {
    true
}
