use crate::error::Result;
use crate::resolver::{DateResolver, DateSource, ResolvedDate};
use chrono::{DateTime, Local};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Uses the file's birth time, or its modification time where the platform
/// does not record one.
///
/// A modification time older than the birth time means the file is a copy
/// that kept its timestamps (camera imports, moves across devices); the older
/// one is used then, so a copied photo keeps its original date.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemResolver;

impl FilesystemResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DateResolver for FilesystemResolver {
    fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
        let metadata = fs::metadata(path)?;

        let modified = metadata.modified();
        let timestamp = match (metadata.created(), modified) {
            (Ok(created), Ok(modified)) => created.min(modified),
            (Ok(created), Err(_)) => created,
            (Err(e), modified) => {
                debug!(path = %path.display(), error = %e, "no birth time, using modification time");
                modified?
            }
        };

        let local: DateTime<Local> = timestamp.into();
        Ok(ResolvedDate::new(local.naive_local(), DateSource::Filesystem))
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
