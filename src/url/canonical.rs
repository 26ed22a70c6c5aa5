use crate::{UrlError, UrlResult};
use std::fmt;
use url::Url;

/// A URL with its fragment removed; the deduplication identity of a page
///
/// Two navigation entries with the same canonical URL point at the same
/// printable destination, whatever anchor they jump to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Computes the canonical URL of a navigation target
///
/// Only the fragment is removed; scheme, host, path and query are kept as
/// the URL parser normalizes them.
/// Strings that do not parse as URLs are cut at the first `#`.
///
/// # Examples
///
/// ```
/// use navpress::url::canonical_url;
///
/// let canonical = canonical_url("https://docs.example.com/a.htm#GUID-1");
/// assert_eq!(canonical.as_str(), "https://docs.example.com/a.htm");
/// ```
pub fn canonical_url(url: &str) -> CanonicalUrl {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            CanonicalUrl(parsed.into())
        }
        Err(_) => CanonicalUrl(url.split('#').next().unwrap_or_default().to_string()),
    }
}

/// Parses a string into a canonical URL, rejecting non-http(s) schemes
pub fn parse_canonical(url: &str) -> UrlResult<CanonicalUrl> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            parsed.scheme()
        )));
    }

    Ok(canonical_url(parsed.as_str()))
}
