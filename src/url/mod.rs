//! URL handling module for Navpress
//!
//! This module provides the canonical URL used as the crawl's deduplication
//! key and resolution of navigation hrefs against the page they appear on.

mod canonical;
mod resolve;

pub use canonical::{canonical_url, parse_canonical, CanonicalUrl};
pub use resolve::resolve_href;
