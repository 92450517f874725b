pub mod candidate_scanner;
pub mod denylist;

pub use candidate_scanner::{CandidateFile, CandidateScanner, ScanResult};
pub use denylist::Denylist;
