pub mod cli;
pub mod config;
pub mod error;
pub mod organizer;
pub mod resolver;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, CollisionPolicy, Config, MetadataConfig, PlacementConfig, ScanConfig};
pub use error::{OrganizerError, Result, UserFriendlyError};

// Core functionality re-exports
pub use organizer::{FileOrganizer, FileOutcome, FileReport, OrganizeProgress, Placement, Tally};
pub use resolver::{
    build_resolver, DateResolver, DateSource, FallbackResolver, FilesystemResolver,
    MetadataToolResolver, ResolvedDate,
};
pub use scanner::{CandidateFile, CandidateScanner, Denylist, ScanResult};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::{Path, PathBuf};
use tracing::info;

/// Main library interface: one organizing run over a root directory
pub struct PhotoOrganizer {
    config: Config,
    root: PathBuf,
    dry_run: bool,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl PhotoOrganizer {
    pub fn new<P: Into<PathBuf>>(
        config: Config,
        root: P,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
    ) -> Result<Self> {
        Ok(Self {
            config,
            root: root.into(),
            dry_run: false,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(!quiet && output_mode == OutputMode::Human),
            shutdown: GracefulShutdown::new()?,
        })
    }

    /// Create an instance for testing (no signal handler registration)
    pub fn new_for_test<P: Into<PathBuf>>(config: Config, root: P) -> Self {
        Self {
            config,
            root: root.into(),
            dry_run: false,
            output_formatter: OutputFormatter::new(OutputMode::Plain, 0, true),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(
            Self::new(config, &cli_args.root, output_mode, cli_args.verbose, cli_args.quiet)?
                .with_dry_run(cli_args.dry_run),
        )
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Scans the root, then sorts every candidate into `<year>/<month>/`.
    ///
    /// Per-file failures are part of the returned progress; only problems with
    /// the root itself are returned as errors.
    pub fn organize(&self) -> Result<OrganizeProgress> {
        self.shutdown.check_shutdown()?;

        let candidates = self.scan_candidates()?;
        self.shutdown.check_shutdown()?;

        if candidates.is_empty() {
            self.output_formatter
                .warning(&format!("No files to organize in {}", self.root.display()));
        }

        let progress = self.organize_candidates(candidates);
        if progress.cancelled {
            self.output_formatter.warning("Stopped before all files were processed");
        }

        Ok(progress)
    }

    fn scan_candidates(&self) -> Result<Vec<CandidateFile>> {
        self.output_formatter
            .start_operation(&format!("Scanning {}", self.root.display()));

        let spinner = self.progress_manager.create_spinner("Looking for photos...");
        let scan = CandidateScanner::new(&self.config.scan).scan_directory(&self.root);
        spinner.finish_and_clear();
        let scan = scan?;

        for walk_error in &scan.walk_errors {
            self.output_formatter.warning(walk_error);
        }
        if let Some(first) = scan.depth_limited.first() {
            self.output_formatter.warning(&format!(
                "{} folder(s) below scan.max_depth = {} were not scanned (e.g. {})",
                scan.depth_limited.len(),
                self.config.scan.max_depth,
                first.display()
            ));
        }

        info!(candidates = scan.candidates.len(), denied = scan.denied, "scan finished");
        self.output_formatter.info(&format!(
            "Found {} files ({} skipped by name)",
            scan.candidates.len(),
            scan.denied
        ));

        Ok(scan.candidates)
    }

    fn organize_candidates(&self, candidates: Vec<CandidateFile>) -> OrganizeProgress {
        let operation = if self.dry_run {
            "Planning moves (dry run)"
        } else {
            "Organizing photos"
        };
        self.output_formatter.start_operation(operation);

        let placement = Placement::new(&self.root)
            .with_collision_policy(self.config.placement.on_collision)
            .with_dry_run(self.dry_run);
        let organizer = FileOrganizer::new(build_resolver(&self.config.metadata), placement);

        let file_progress = self
            .progress_manager
            .create_file_progress(candidates.len() as u64);
        let progress_callback = |progress: &OrganizeProgress| {
            ui::progress::update_file_progress(&file_progress, progress);
            if let Some(report) = progress.last_report() {
                self.progress_manager.suspend(|| {
                    self.output_formatter.print_file_outcome(report, &self.root)
                });
            }
        };

        let progress = organizer.organize(candidates, &self.shutdown, Some(&progress_callback));

        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Processed {} files", progress.files_processed),
            progress.elapsed(),
        );
        self.progress_manager.clear();

        progress
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &OrganizerError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
