pub mod fallback;
pub mod filesystem;
pub mod metadata_tool;

pub use fallback::FallbackResolver;
pub use filesystem::FilesystemResolver;
pub use metadata_tool::{parse_capture_date, MetadataToolResolver};

use crate::config::MetadataConfig;
use crate::error::Result;
use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSource {
    Metadata,
    Filesystem,
}

/// The date a file is filed under, and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub datetime: NaiveDateTime,
    pub source: DateSource,
}

impl ResolvedDate {
    pub fn new(datetime: NaiveDateTime, source: DateSource) -> Self {
        Self { datetime, source }
    }

    /// Four-digit year, e.g. "2023".
    pub fn year(&self) -> String {
        format!("{:04}", self.datetime.year())
    }

    /// Zero-padded month, e.g. "06".
    pub fn month(&self) -> String {
        format!("{:02}", self.datetime.month())
    }
}

pub trait DateResolver {
    fn resolve(&self, path: &Path) -> Result<ResolvedDate>;

    fn name(&self) -> &'static str;
}

impl<R: DateResolver + ?Sized> DateResolver for Box<R> {
    fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
        (**self).resolve(path)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Builds the resolver chain for a run: metadata tool first when enabled,
/// filesystem timestamps otherwise or as fallback.
pub fn build_resolver(config: &MetadataConfig) -> Box<dyn DateResolver> {
    if config.enabled {
        Box::new(FallbackResolver::new(
            MetadataToolResolver::new(config),
            FilesystemResolver::new(),
        ))
    } else {
        Box::new(FilesystemResolver::new())
    }
}
