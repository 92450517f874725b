use crate::error::Result;
use crate::resolver::{DateResolver, ResolvedDate};
use std::path::Path;
use tracing::debug;

/// Tries `primary`, and consults `fallback` only when the primary failure is
/// one a timestamp can stand in for. Anything else is returned as-is.
pub struct FallbackResolver<P, F> {
    primary: P,
    fallback: F,
}

impl<P: DateResolver, F: DateResolver> FallbackResolver<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: DateResolver, F: DateResolver> DateResolver for FallbackResolver<P, F> {
    fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
        match self.primary.resolve(path) {
            Ok(date) => Ok(date),
            Err(e) if e.is_recoverable_resolution() => {
                debug!(
                    path = %path.display(),
                    reason = %e,
                    "{} failed, falling back to {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.resolve(path)
            }
            Err(e) => Err(e),
        }
    }

    fn name(&self) -> &'static str {
        "metadata-with-fallback"
    }
}
