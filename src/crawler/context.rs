use crate::output::{CrawlReport, HierarchyLog};
use crate::url::CanonicalUrl;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Mutable state of one crawl
///
/// Owned by the crawler and threaded through every walk step, so separate
/// crawls in one process never share a visited set.
#[derive(Debug)]
pub struct CrawlSession {
    visited: HashSet<CanonicalUrl>,
    opened_folders: HashSet<CanonicalUrl>,
    expected: BTreeMap<PathBuf, String>,
    hierarchy: HierarchyLog,
    pub report: CrawlReport,
}

impl CrawlSession {
    pub fn new(hierarchy: HierarchyLog) -> Self {
        Self {
            visited: HashSet::new(),
            opened_folders: HashSet::new(),
            expected: BTreeMap::new(),
            hierarchy,
            report: CrawlReport::new(),
        }
    }

    /// Marks `url` visited, returning false if it already was
    pub fn mark_visited(&mut self, url: CanonicalUrl) -> bool {
        self.visited.insert(url)
    }

    /// Whether the lazy folder at `url` was already opened and scraped
    pub fn is_folder_opened(&self, url: &CanonicalUrl) -> bool {
        self.opened_folders.contains(url)
    }

    /// Marks the lazy folder at `url` opened, returning false if it already was
    pub fn mark_folder_opened(&mut self, url: CanonicalUrl) -> bool {
        self.opened_folders.insert(url)
    }

    /// Records that `path` must exist after the walk, rendered from `url`
    pub fn expect(&mut self, path: PathBuf, url: impl Into<String>) {
        self.expected.insert(path, url.into());
    }

    pub fn expected(&self) -> &BTreeMap<PathBuf, String> {
        &self.expected
    }

    pub fn hierarchy(&mut self) -> &mut HierarchyLog {
        &mut self.hierarchy
    }

    pub fn into_parts(self) -> (BTreeMap<PathBuf, String>, CrawlReport) {
        (self.expected, self.report)
    }
}
