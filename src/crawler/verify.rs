use crate::config::VerifyConfig;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why an expected artifact failed its check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactProblem {
    Missing,
    TooSmall { bytes: u64 },
}

impl fmt::Display for ArtifactProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TooSmall { bytes } => write!(f, "only {} bytes", bytes),
        }
    }
}

/// An expected artifact that failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedArtifact {
    pub path: PathBuf,
    pub url: String,
    pub problem: ArtifactProblem,
}

/// Checks that every expected artifact exists and is plausibly sized
///
/// Anything below the byte threshold is treated as an error page or blank
/// output rather than real content.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityVerifier {
    min_bytes: u64,
}

impl IntegrityVerifier {
    pub fn new(min_bytes: u64) -> Self {
        Self { min_bytes }
    }

    pub fn from_config(config: &VerifyConfig) -> Self {
        Self::new(config.min_artifact_bytes)
    }

    /// Checks one artifact
    pub fn check(&self, path: &Path) -> Option<ArtifactProblem> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() && meta.len() >= self.min_bytes => None,
            Ok(meta) if meta.is_file() => Some(ArtifactProblem::TooSmall { bytes: meta.len() }),
            _ => Some(ArtifactProblem::Missing),
        }
    }

    /// Checks every expected artifact, returning failures in path order
    pub fn verify(&self, expected: &BTreeMap<PathBuf, String>) -> Vec<FailedArtifact> {
        expected
            .iter()
            .filter_map(|(path, url)| {
                self.check(path).map(|problem| FailedArtifact {
                    path: path.clone(),
                    url: url.clone(),
                    problem,
                })
            })
            .collect()
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    pub fn from_config(config: &VerifyConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Maximum retries per failed artifact
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before the 1-based `attempt`, doubling each time
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt - 1))
    }
}
