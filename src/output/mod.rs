//! Output module for the artifact tree and its side files
//!
//! This module handles:
//! - Naming artifacts and directories so path order equals crawl order
//! - The incremental hierarchy log and the parsed-tree debug dump
//! - Merging the artifact tree into one combined document
//! - The end-of-run crawl report

mod hierarchy;
mod merge;
mod paths;
mod report;

pub use hierarchy::{write_debug_tree, HierarchyLog};
pub use merge::{collect_artifacts, merge_artifacts, MergeError, MergeReport};
pub use paths::{
    artifact_dir_name, artifact_file_name, introduction_file_name, ordinal_width, sanitize_title,
    title_from_artifact,
};
pub use report::{print_report, CrawlReport, Unrecovered};
