pub mod file_organizer;
pub mod placement;
pub mod tally;

pub use file_organizer::{FileOrganizer, FileReport, OrganizeProgress};
pub use placement::{FileOutcome, Placement};
pub use tally::{Tally, ERROR_BUCKET};
