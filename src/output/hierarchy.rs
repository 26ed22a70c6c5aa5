use crate::tree::Node;
use crate::NavpressError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const HEADER: &str = "Full Detected Hierarchy\n=======================\n";

/// Human-readable log of the output tree, appended to as the walk progresses
///
/// Write failures are logged and otherwise ignored: the log is an aid for
/// the operator, never an input to the crawl.
#[derive(Debug)]
pub struct HierarchyLog {
    path: PathBuf,
    file: Option<File>,
}

impl HierarchyLog {
    /// Truncates `path` and writes the header
    pub fn create(path: &Path) -> Self {
        let file = File::create(path).and_then(|mut file| {
            file.write_all(HEADER.as_bytes())?;
            Ok(file)
        });

        match file {
            Ok(file) => Self {
                path: path.to_path_buf(),
                file: Some(file),
            },
            Err(e) => {
                tracing::warn!("Cannot write hierarchy log {}: {}", path.display(), e);
                Self::disabled()
            }
        }
    }

    /// A log that discards everything
    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records a created directory at `depth`
    pub fn directory(&mut self, depth: usize, name: &str) {
        self.line(depth, &format!("[+] {}/", name));
    }

    /// Records a scheduled artifact at `depth`
    pub fn artifact(&mut self, depth: usize, name: &str) {
        self.line(depth, &format!("[-] {}", name));
    }

    fn line(&mut self, depth: usize, text: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let result = writeln!(file, "{}{}", "  ".repeat(depth), text).and_then(|_| file.flush());
        if let Err(e) = result {
            tracing::warn!("Hierarchy log write failed ({}): {}", self.path.display(), e);
            self.file = None;
        }
    }
}

/// Writes the initially parsed tree as pretty JSON
pub fn write_debug_tree(path: &Path, tree: &[Node]) -> Result<(), NavpressError> {
    let json = serde_json::to_string_pretty(tree)?;
    std::fs::write(path, json).map_err(|source| NavpressError::Output {
        path: path.display().to_string(),
        source,
    })
}
