use crate::error::{OrganizerError, UserFriendlyError};
use crate::organizer::{FileOutcome, FileReport, OrganizeProgress};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static CAMERA: Emoji = Emoji("📷 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    // Core messaging methods
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    /// A file that could not be organized. Goes to stdout next to the summary;
    /// in JSON mode the summary's `errors` list carries it instead.
    pub fn file_failure(&self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}{}", CROSS, style(message).red());
                } else {
                    println!("✗ {}", message);
                }
            }
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => println!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", CAMERA, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &OrganizerError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    /// Per-file line: failures always, moves from `-v` up.
    pub fn print_file_outcome(&self, report: &FileReport, root: &Path) {
        let source = report.candidate.display_path();

        match &report.outcome {
            FileOutcome::Failed { reason } => {
                self.file_failure(&format!(
                    "Could not process {}: {}",
                    report.candidate.source_path.display(),
                    reason
                ));
            }
            FileOutcome::Moved { destination, .. } => {
                self.info(&format!("Moved {} to {}", source, relative_to(destination, root)));
            }
            FileOutcome::Planned { destination, .. } => {
                self.info(&format!("Would move {} to {}", source, relative_to(destination, root)));
            }
            FileOutcome::AlreadyInPlace { .. } => {
                self.debug(&format!("{} is already organized", source));
            }
        }
    }

    pub fn print_summary(&self, progress: &OrganizeProgress, root: &Path) {
        match self.mode {
            OutputMode::Human => self.print_human_summary(progress),
            OutputMode::Json => self.print_json_summary(progress, root),
            OutputMode::Plain => self.print_plain_summary(progress),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Error => (&CROSS, style(message).red().bold()),
                MessageType::Warning => (&WARNING, style(message).yellow().bold()),
                MessageType::Info => (&INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    /// Progress events go to stderr; stdout is reserved for the summary document.
    fn print_json_object(&self, obj: &serde_json::Value) {
        eprintln!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, progress: &OrganizeProgress) {
        let highlight = |value: String| {
            if self.use_colors {
                style(value).cyan().bold().to_string()
            } else {
                value
            }
        };

        println!();
        self.print_separator();

        let headline = if progress.cancelled {
            "Organizing stopped early"
        } else if progress.dry_run {
            "Dry run completed"
        } else {
            "Photo organizing completed"
        };
        match (self.use_colors, progress.cancelled) {
            (true, true) => println!("{}", style(headline).yellow().bold()),
            (true, false) => println!("{} {}", style(headline).green().bold(), CHECKMARK),
            (false, true) => println!("! {}", headline),
            (false, false) => println!("✓ {}", headline),
        }
        println!();
        println!("  Summary: {}", highlight(progress.tally.to_string()));
        if progress.tally.is_empty() {
            println!("  No photos found");
        }

        println!();
        if progress.dry_run {
            println!("  Would move:      {}", highlight(progress.planned.to_string()));
        } else {
            println!("  Moved:           {}", highlight(progress.moved.to_string()));
        }
        if progress.in_place > 0 {
            println!("  Already sorted:  {}", progress.in_place);
        }
        if progress.from_filesystem > 0 {
            println!(
                "  Dated by file time (no capture date): {}",
                progress.from_filesystem
            );
        }
        println!(
            "  Time taken:      {}",
            highlight(format_duration(progress.elapsed()))
        );

        self.print_separator();
    }

    fn print_json_summary(&self, progress: &OrganizeProgress, root: &Path) {
        let files: Vec<serde_json::Value> = progress
            .files
            .iter()
            .map(|report| file_report_json(report, root))
            .collect();

        let summary = serde_json::json!({
            "type": "summary",
            "root": root.display().to_string(),
            "tally": progress.tally,
            "files_processed": progress.files_processed,
            "moved": progress.moved,
            "already_in_place": progress.in_place,
            "planned": progress.planned,
            "dated_by_metadata": progress.from_metadata,
            "dated_by_filesystem": progress.from_filesystem,
            "errors": progress.errors,
            "cancelled": progress.cancelled,
            "dry_run": progress.dry_run,
            "duration_ms": progress.elapsed().as_millis(),
            "files": files,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_plain_summary(&self, progress: &OrganizeProgress) {
        let status = if progress.cancelled {
            "CANCELLED"
        } else if progress.dry_run {
            "DRY RUN COMPLETED"
        } else {
            "COMPLETED"
        };
        println!("{}: Photo organizing", status);
        println!("Summary: {}", progress.tally);
        println!("Moved: {}", progress.moved);
        if progress.dry_run {
            println!("Planned: {}", progress.planned);
        }
        if progress.in_place > 0 {
            println!("Already in place: {}", progress.in_place);
        }
        if progress.cancelled {
            println!("Cancelled: true");
        }
        println!("Duration: {:?}", progress.elapsed());
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Warning,
    Info,
}

fn relative_to(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn file_report_json(report: &FileReport, root: &Path) -> serde_json::Value {
    let mut entry = serde_json::json!({
        "path": report.candidate.display_path(),
        "outcome": report.outcome.kind(),
    });

    if let Some(destination) = report.outcome.destination() {
        entry["destination"] = serde_json::json!(relative_to(destination, root));
    }
    if let Some(date) = report.outcome.date() {
        entry["date"] = serde_json::json!(date.datetime.format("%Y-%m-%dT%H:%M:%S").to_string());
        entry["date_source"] = serde_json::json!(date.source);
    }
    if let FileOutcome::Failed { reason } = &report.outcome {
        entry["error"] = serde_json::json!(reason.to_string());
    }

    entry
}
