use crate::config::DEFAULT_CONFIG_FILES;
use regex::Regex;
use std::path::Path;

/// Housekeeping files written by operating systems and file browsers.
const OS_HOUSEKEEPING: &[&str] = &[".DS_Store", "Thumbs.db", "ehthumbs.db", "desktop.ini", ".localized"];

/// This tool's own artifacts, including the script it replaced.
const TOOL_ARTIFACTS: &[&str] = &["photo-organizer", "photo-organizer.exe", "organize_photos.py"];

/// AppleDouble resource forks ("._IMG_0001.JPG") left on non-HFS volumes.
const APPLE_DOUBLE_PATTERN: &str = r"^\._.+";

/// Fixed set of file names that are never moved or counted.
pub struct Denylist {
    names: Vec<String>,
    patterns: Vec<Regex>,
}

impl Denylist {
    pub fn new() -> Self {
        let mut names: Vec<String> = OS_HOUSEKEEPING
            .iter()
            .chain(TOOL_ARTIFACTS)
            .chain(DEFAULT_CONFIG_FILES)
            .map(|name| name.to_string())
            .collect();

        if let Some(own_name) = own_executable_name() {
            if !names.contains(&own_name) {
                names.push(own_name);
            }
        }

        let patterns = [APPLE_DOUBLE_PATTERN]
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self { names, patterns }
    }

    pub fn is_denied(&self, path: &Path) -> bool {
        match path.file_name().and_then(|s| s.to_str()) {
            Some(filename) => self.is_denied_name(filename),
            None => false,
        }
    }

    pub fn is_denied_name(&self, filename: &str) -> bool {
        if self.names.iter().any(|name| name == filename) {
            return true;
        }

        // Windows housekeeping files show up with arbitrary case
        let lower = filename.to_lowercase();
        if matches!(lower.as_str(), "thumbs.db" | "desktop.ini" | "ehthumbs.db") {
            return true;
        }

        self.patterns.iter().any(|pattern| pattern.is_match(filename))
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new()
    }
}

fn own_executable_name() -> Option<String> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_name().map(|n| n.to_string_lossy().to_string()))
}
