use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Bucket name used for files that could not be organized.
pub const ERROR_BUCKET: &str = "error";

/// Per-run count of files by destination year, plus failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    by_year: BTreeMap<String, usize>,
    errors: usize,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_year<S: Into<String>>(&mut self, year: S) {
        *self.by_year.entry(year.into()).or_insert(0) += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn count(&self, year: &str) -> usize {
        self.by_year.get(year).copied().unwrap_or(0)
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn successes(&self) -> usize {
        self.by_year.values().sum()
    }

    /// Year buckets plus the error bucket.
    pub fn total(&self) -> usize {
        self.successes() + self.errors
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// The flat year/"error" mapping printed at the end of a run.
    pub fn to_map(&self) -> BTreeMap<String, usize> {
        let mut map = self.by_year.clone();
        if self.errors > 0 {
            map.insert(ERROR_BUCKET.to_string(), self.errors);
        }
        map
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .to_map()
            .iter()
            .map(|(bucket, count)| format!("{}: {}", bucket, count))
            .collect();
        write!(f, "{{{}}}", entries.join(", "))
    }
}
