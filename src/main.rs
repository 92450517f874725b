use clap::Parser;
use photo_organizer::{
    config, Cli, OrganizerError, OutputFormatter, OutputMode, PhotoOrganizer, UserFriendlyError,
};
use std::io::IsTerminal;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let organizer = match PhotoOrganizer::from_cli(&cli) {
        Ok(organizer) => organizer,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    match organizer.organize() {
        Ok(progress) => {
            organizer
                .output_formatter()
                .print_summary(&progress, organizer.root());

            // Individual file failures are reported in the summary, not the exit code
            if progress.cancelled {
                130
            } else {
                0
            }
        }
        Err(e) => {
            organizer.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &OrganizerError) -> i32 {
    match error {
        OrganizerError::Cancelled => 130, // Interrupted (SIGINT)
        OrganizerError::InvalidRoot { .. } | OrganizerError::Permission { .. } => 2,
        OrganizerError::Config { .. } => 3,
        _ => 1, // General error
    }
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config::default_config_path(&cli.root));

    match PhotoOrganizer::generate_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nFiles named photo-organizer.toml in the folder being organized are picked up automatically.");
            println!("Edit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &OrganizerError) {
    // Create a basic formatter for startup errors
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
