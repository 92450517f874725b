use crate::config::ScanConfig;
use crate::error::{OrganizerError, Result};
use crate::scanner::denylist::Denylist;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub filename: String,
}

impl CandidateFile {
    pub fn new(source_path: PathBuf, relative_path: PathBuf) -> Self {
        let filename = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Self {
            source_path,
            relative_path,
            filename,
        }
    }

    pub fn display_path(&self) -> String {
        self.relative_path.display().to_string()
    }
}

/// Everything found by one walk of the root.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub candidates: Vec<CandidateFile>,
    pub denied: usize,
    pub walk_errors: Vec<String>,
    /// Directories at `max_depth` whose contents were not scanned.
    pub depth_limited: Vec<PathBuf>,
}

pub struct CandidateScanner {
    denylist: Denylist,
    max_depth: usize,
    follow_links: bool,
}

impl CandidateScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            denylist: Denylist::new(),
            max_depth: config.max_depth,
            follow_links: config.follow_links,
        }
    }

    /// Walks `root` and collects every non-denylisted file, sorted by relative path.
    ///
    /// The full list is built before anything is moved, so directories created
    /// while organizing are never revisited in the same run.
    pub fn scan_directory<P: AsRef<Path>>(&self, root: P) -> Result<ScanResult> {
        let root_path = root.as_ref();

        if !root_path.is_dir() {
            return Err(OrganizerError::InvalidRoot {
                path: root_path.display().to_string(),
            });
        }

        // Fail fast if the root itself cannot be listed
        std::fs::read_dir(root_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => OrganizerError::Permission {
                path: root_path.display().to_string(),
            },
            _ => OrganizerError::Io(e),
        })?;

        let mut result = ScanResult::default();

        let walker = WalkDir::new(root_path)
            .max_depth(self.max_depth)
            .follow_links(self.follow_links)
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    result.walk_errors.push(format!("Scan error: {}", err));
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() == self.max_depth && entry.depth() > 0 && has_entries(entry.path()) {
                    debug!(path = %entry.path().display(), "depth limit reached, not descending");
                    result.depth_limited.push(entry.path().to_path_buf());
                }
                continue;
            }

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if self.denylist.is_denied(path) {
                debug!(path = %path.display(), "denylisted, not a candidate");
                result.denied += 1;
                continue;
            }

            let relative_path = calculate_relative_path(path, root_path)?;
            result
                .candidates
                .push(CandidateFile::new(path.to_path_buf(), relative_path));
        }

        result
            .candidates
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        Ok(result)
    }
}

fn has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn calculate_relative_path(file_path: &Path, root_path: &Path) -> Result<PathBuf> {
    file_path
        .strip_prefix(root_path)
        .map(Path::to_path_buf)
        .map_err(|_| OrganizerError::InvalidPath {
            path: format!(
                "Cannot calculate relative path for {} from root {}",
                file_path.display(),
                root_path.display()
            ),
        })
}
