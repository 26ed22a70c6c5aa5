//! Artifact naming
//!
//! Every directory and file the crawl creates is `<ordinal>_<title>`, with a
//! zero-padded ordinal so that a plain lexicographic sort of the output tree
//! reproduces crawl order. Ordinals are three digits wide unless a sibling
//! list is too long for that, in which case the whole list is widened.

use percent_encoding::percent_decode_str;
use std::path::Path;

const MIN_ORDINAL_WIDTH: usize = 3;
const MAX_TITLE_CHARS: usize = 80;
const FORBIDDEN: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Makes a navigation title safe to use as a path segment
///
/// Percent-escapes are decoded, characters that are illegal on common
/// filesystems are dropped, spaces become underscores, and the result is
/// capped at 80 characters.
pub fn sanitize_title(title: &str) -> String {
    let decoded = percent_decode_str(title).decode_utf8_lossy();
    let cleaned: String = decoded.chars().filter(|c| !FORBIDDEN.contains(c)).collect();

    cleaned
        .trim()
        .replace(' ', "_")
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Ordinal width shared by every entry of a sibling list of `len` entries
pub fn ordinal_width(len: usize) -> usize {
    let digits = len.checked_ilog10().map_or(1, |log| log as usize + 1);
    digits.max(MIN_ORDINAL_WIDTH)
}

/// Directory name for a group or lazy folder
pub fn artifact_dir_name(ordinal: usize, width: usize, title: &str) -> String {
    format!("{:0width$}_{}", ordinal, sanitize_title(title), width = width)
}

/// File name for a rendered link
pub fn artifact_file_name(ordinal: usize, width: usize, title: &str) -> String {
    format!("{:0width$}_{}.pdf", ordinal, sanitize_title(title), width = width)
}

/// File name of a directory's own landing page, sorting before its siblings
///
/// `000_Introduction.pdf` for ordinary lists.
pub fn introduction_file_name(width: usize) -> String {
    format!("{:0width$}_Introduction.pdf", 0, width = width)
}

/// Best-effort title reconstructed from an artifact's file name
///
/// `007_Buffer_Analysis.pdf` becomes `Buffer Analysis`.
pub fn title_from_artifact(path: &Path) -> String {
    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = stem.strip_suffix(".pdf").unwrap_or(&stem);

    stem.split('_').skip(1).collect::<Vec<_>>().join(" ")
}
