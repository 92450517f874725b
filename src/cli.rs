use crate::config::{CliOverrides, CollisionPolicy, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photo-organizer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sort photos into year/month folders by capture date")]
#[command(
    long_about = "Photo Organizer walks a folder, reads each file's capture date with exiftool \
                  (falling back to the file's creation time) and moves it into <year>/<month>/."
)]
#[command(after_help = "EXAMPLES:\n  \
    photo-organizer\n  \
    photo-organizer ~/Pictures/import --dry-run -v\n  \
    photo-organizer ~/Pictures/import --no-metadata\n  \
    photo-organizer ~/Pictures/import --on-collision rename --output-format json")]
pub struct Cli {
    /// Folder to organize (defaults to the current directory)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Metadata tool to run instead of exiftool
    #[arg(long, value_name = "PROGRAM")]
    pub metadata_tool: Option<String>,

    /// Skip the metadata tool and use filesystem dates only
    #[arg(long)]
    pub no_metadata: bool,

    /// What to do when the destination already has a file of the same name
    #[arg(long, value_enum)]
    pub on_collision: Option<CollisionPolicy>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "Show where files would go without moving anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Write a sample configuration file and exit")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref(), &self.root)?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_metadata_tool(self.metadata_tool.clone())
            .with_no_metadata(self.no_metadata)
            .with_on_collision(self.on_collision)
    }

    /// Default tracing filter when RUST_LOG is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "photo_organizer=info",
                2 => "photo_organizer=debug",
                _ => "photo_organizer=trace",
            }
        }
    }
}
