use crate::error::{OrganizerError, Result};
use crate::organizer::placement::{FileOutcome, Placement};
use crate::organizer::tally::Tally;
use crate::resolver::{DateResolver, DateSource};
use crate::scanner::CandidateFile;
use crate::ui::GracefulShutdown;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One candidate and what happened to it.
#[derive(Debug)]
pub struct FileReport {
    pub candidate: CandidateFile,
    pub outcome: FileOutcome,
}

#[derive(Debug)]
pub struct OrganizeProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub moved: usize,
    pub in_place: usize,
    pub planned: usize,
    pub from_metadata: usize,
    pub from_filesystem: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub tally: Tally,
    pub errors: Vec<String>,
    pub files: Vec<FileReport>,
    pub cancelled: bool,
    pub dry_run: bool,
}

impl OrganizeProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            moved: 0,
            in_place: 0,
            planned: 0,
            from_metadata: 0,
            from_filesystem: 0,
            current_file: None,
            start_time: Instant::now(),
            tally: Tally::new(),
            errors: Vec::new(),
            files: Vec::new(),
            cancelled: false,
            dry_run: false,
        }
    }

    pub fn record(&mut self, candidate: CandidateFile, outcome: FileOutcome) {
        self.files_processed += 1;
        self.current_file = Some(candidate.display_path());

        match outcome.date().map(|d| d.source) {
            Some(DateSource::Metadata) => self.from_metadata += 1,
            Some(DateSource::Filesystem) => self.from_filesystem += 1,
            None => {}
        }

        match &outcome {
            FileOutcome::Moved { date, .. } => {
                self.moved += 1;
                self.tally.record_year(date.year());
            }
            FileOutcome::AlreadyInPlace { date, .. } => {
                self.in_place += 1;
                self.tally.record_year(date.year());
            }
            FileOutcome::Planned { date, .. } => {
                self.planned += 1;
                self.tally.record_year(date.year());
            }
            FileOutcome::Failed { reason } => {
                self.tally.record_error();
                self.errors.push(format!(
                    "Could not process {}: {}",
                    candidate.source_path.display(),
                    reason
                ));
            }
        }

        self.files.push(FileReport { candidate, outcome });
    }

    pub fn last_report(&self) -> Option<&FileReport> {
        self.files.last()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.elapsed();
        let rate = self.files_processed as f64 / elapsed.as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Runs each candidate through resolve date → ensure directory → move → tally.
pub struct FileOrganizer<R> {
    resolver: R,
    placement: Placement,
}

impl<R: DateResolver> FileOrganizer<R> {
    pub fn new(resolver: R, placement: Placement) -> Self {
        Self {
            resolver,
            placement,
        }
    }

    /// Organizes one file. Failures come back as `FileOutcome::Failed`.
    ///
    /// A shutdown requested while the date was being resolved leaves the file
    /// untouched and yields `Failed { reason: Cancelled }`.
    pub fn process_file(&self, candidate: &CandidateFile, shutdown: &GracefulShutdown) -> FileOutcome {
        match self.try_process(candidate, shutdown) {
            Ok(outcome) => outcome,
            Err(reason) => {
                debug!(path = %candidate.source_path.display(), error = %reason, "could not process file");
                FileOutcome::Failed { reason }
            }
        }
    }

    fn try_process(&self, candidate: &CandidateFile, shutdown: &GracefulShutdown) -> Result<FileOutcome> {
        let date = self.resolver.resolve(&candidate.source_path)?;
        // The resolution may have been cut short by the interrupt
        shutdown.check_shutdown()?;
        self.placement.place(&candidate.source_path, &date)
    }

    /// Processes every candidate in order, stopping early only on shutdown.
    pub fn organize(
        &self,
        candidates: Vec<CandidateFile>,
        shutdown: &GracefulShutdown,
        progress_callback: Option<&dyn Fn(&OrganizeProgress)>,
    ) -> OrganizeProgress {
        let mut progress = OrganizeProgress::new(candidates.len());
        progress.dry_run = self.placement.is_dry_run();

        for candidate in candidates {
            if !shutdown.is_running() {
                break;
            }

            let outcome = self.process_file(&candidate, shutdown);
            if matches!(outcome, FileOutcome::Failed { reason: OrganizerError::Cancelled }) {
                info!(path = %candidate.source_path.display(), "interrupted, file left in place");
                break;
            }
            progress.record(candidate, outcome);

            if let Some(callback) = progress_callback {
                callback(&progress);
            }
        }

        progress.cancelled = !shutdown.is_running();
        progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionPolicy;
    use crate::resolver::ResolvedDate;
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Dates every file by a leading "YYYYMM_" in its name; anything else fails.
    struct NameDateResolver;

    impl DateResolver for NameDateResolver {
        fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let year: i32 = name.get(0..4).and_then(|s| s.parse().ok()).ok_or_else(|| {
                OrganizerError::Io(std::io::Error::new(std::io::ErrorKind::Other, "no date"))
            })?;
            let month: u32 = name.get(4..6).and_then(|s| s.parse().ok()).unwrap_or(1);
            let datetime = NaiveDate::from_ymd_opt(year, month, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            Ok(ResolvedDate::new(datetime, DateSource::Metadata))
        }

        fn name(&self) -> &'static str {
            "name"
        }
    }

    /// Simulates Ctrl+C arriving while the date of `interrupt_on` is being read.
    struct InterruptingResolver<'a> {
        shutdown: &'a GracefulShutdown,
        interrupt_on: &'static str,
    }

    impl DateResolver for InterruptingResolver<'_> {
        fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
            if path.ends_with(self.interrupt_on) {
                self.shutdown.request_shutdown();
            }
            NameDateResolver.resolve(path)
        }

        fn name(&self) -> &'static str {
            "interrupting"
        }
    }

    fn candidate(root: &Path, relative: &str) -> CandidateFile {
        let source = root.join(relative);
        if let Some(parent) = source.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&source, relative).unwrap();
        CandidateFile::new(source, PathBuf::from(relative))
    }

    #[test]
    fn test_organize_tallies_every_candidate() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates = vec![
            candidate(root, "202306_a.jpg"),
            candidate(root, "trip/202307_b.jpg"),
            candidate(root, "201901_c.jpg"),
            candidate(root, "undated.jpg"),
        ];

        let organizer = FileOrganizer::new(NameDateResolver, Placement::new(root));
        let progress = organizer.organize(candidates, &GracefulShutdown::new_for_test(), None);

        assert_eq!(progress.files_processed, 4);
        assert_eq!(progress.moved, 3);
        assert_eq!(progress.from_metadata, 3);
        assert_eq!(progress.from_filesystem, 0);
        assert_eq!(progress.tally.count("2023"), 2);
        assert_eq!(progress.tally.count("2019"), 1);
        assert_eq!(progress.tally.errors(), 1);
        assert_eq!(progress.tally.total(), 4);
        assert_eq!(progress.errors.len(), 1);
        assert!(progress.errors[0].contains("undated.jpg"));

        assert!(root.join("2023/06/202306_a.jpg").exists());
        assert!(root.join("2023/07/202307_b.jpg").exists());
        assert!(root.join("2019/01/201901_c.jpg").exists());
        assert!(!root.join("trip/202307_b.jpg").exists());
        assert!(root.join("undated.jpg").exists());
    }

    #[test]
    fn test_failure_does_not_stop_the_run() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("2023/06")).unwrap();
        fs::write(root.join("2023/06/202306_dup.jpg"), "existing").unwrap();
        let candidates = vec![
            candidate(root, "202306_dup.jpg"),
            candidate(root, "202306_next.jpg"),
        ];

        let organizer = FileOrganizer::new(
            NameDateResolver,
            Placement::new(root).with_collision_policy(CollisionPolicy::Skip),
        );
        let progress = organizer.organize(candidates, &GracefulShutdown::new_for_test(), None);

        assert_eq!(progress.tally.errors(), 1);
        assert_eq!(progress.tally.count("2023"), 1);
        assert!(root.join("202306_dup.jpg").exists());
        assert!(root.join("2023/06/202306_next.jpg").exists());
    }

    #[test]
    fn test_second_run_moves_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let organizer = FileOrganizer::new(NameDateResolver, Placement::new(root));

        let first = organizer.organize(
            vec![candidate(root, "202306_a.jpg"), candidate(root, "202001_b.jpg")],
            &GracefulShutdown::new_for_test(),
            None,
        );
        assert_eq!(first.moved, 2);

        let rescanned = vec![
            CandidateFile::new(root.join("2020/01/202001_b.jpg"), PathBuf::from("2020/01/202001_b.jpg")),
            CandidateFile::new(root.join("2023/06/202306_a.jpg"), PathBuf::from("2023/06/202306_a.jpg")),
        ];
        let second = organizer.organize(rescanned, &GracefulShutdown::new_for_test(), None);

        assert_eq!(second.moved, 0);
        assert_eq!(second.in_place, 2);
        assert_eq!(second.tally, first.tally);
    }

    #[test]
    fn test_shutdown_stops_before_next_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates = vec![
            candidate(root, "202306_a.jpg"),
            candidate(root, "202306_b.jpg"),
        ];

        let shutdown = GracefulShutdown::new_for_test();
        shutdown.request_shutdown();

        let organizer = FileOrganizer::new(NameDateResolver, Placement::new(root));
        let progress = organizer.organize(candidates, &shutdown, None);

        assert!(progress.cancelled);
        assert_eq!(progress.files_processed, 0);
        assert!(root.join("202306_a.jpg").exists());
    }

    #[test]
    fn test_interrupt_during_resolution_leaves_file_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates = vec![
            candidate(root, "202306_a.jpg"),
            candidate(root, "202306_b.jpg"),
        ];

        let shutdown = GracefulShutdown::new_for_test();
        let resolver = InterruptingResolver {
            shutdown: &shutdown,
            interrupt_on: "202306_b.jpg",
        };
        let organizer = FileOrganizer::new(resolver, Placement::new(root));
        let progress = organizer.organize(candidates, &shutdown, None);

        // Interrupted on the last file: still reported as cancelled
        assert!(progress.cancelled);
        assert_eq!(progress.files_processed, 1);
        assert_eq!(progress.tally.count("2023"), 1);
        assert_eq!(progress.tally.errors(), 0);
        assert!(root.join("2023/06/202306_a.jpg").exists());
        assert!(root.join("202306_b.jpg").exists());
        assert!(!root.join("2023/06/202306_b.jpg").exists());
    }

    #[test]
    fn test_dry_run_flag_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let organizer = FileOrganizer::new(NameDateResolver, Placement::new(root).with_dry_run(true));
        let progress = organizer.organize(Vec::new(), &GracefulShutdown::new_for_test(), None);

        assert!(progress.dry_run);
        assert!(!progress.cancelled);
    }

    #[test]
    fn test_progress_callback_sees_each_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let candidates = vec![
            candidate(root, "202306_a.jpg"),
            candidate(root, "202306_b.jpg"),
            candidate(root, "202306_c.jpg"),
        ];

        let calls = Cell::new(0);
        let callback = |progress: &OrganizeProgress| {
            calls.set(calls.get() + 1);
            assert_eq!(progress.files_processed, calls.get());
            assert!(progress.last_report().is_some());
        };

        let organizer = FileOrganizer::new(NameDateResolver, Placement::new(root));
        organizer.organize(candidates, &GracefulShutdown::new_for_test(), Some(&callback));

        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = OrganizeProgress::new(4);

        progress.record(
            CandidateFile::new(PathBuf::from("a.jpg"), PathBuf::from("a.jpg")),
            FileOutcome::Failed {
                reason: OrganizerError::Cancelled,
            },
        );

        assert_eq!(progress.files_processed, 1);
        assert_eq!(progress.current_file.as_deref(), Some("a.jpg"));
        assert_eq!(progress.tally.errors(), 1);
    }
}
