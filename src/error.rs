use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata tool unavailable: {message}")]
    MetadataUnavailable { message: String },

    #[error("Could not parse capture date from metadata output: {output:?}")]
    MetadataUnparseable { output: String },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    MoveFailed {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Permission denied: {path}")]
    Permission { path: String },

    #[error("Invalid root directory: {path}")]
    InvalidRoot { path: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl OrganizerError {
    /// Resolution failures that the filesystem timestamp can stand in for.
    pub fn is_recoverable_resolution(&self) -> bool {
        matches!(
            self,
            OrganizerError::MetadataUnavailable { .. } | OrganizerError::MetadataUnparseable { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for OrganizerError {
    fn user_message(&self) -> String {
        match self {
            OrganizerError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            OrganizerError::Permission { path } => {
                format!("Permission denied accessing: {}", path)
            }
            OrganizerError::InvalidRoot { path } => {
                format!("Cannot organize {}: not a readable directory", path)
            }
            OrganizerError::InvalidPath { path } => {
                format!("Invalid file path: {}", path)
            }
            OrganizerError::DestinationExists { path } => {
                format!("A file with the same name already exists at {}", path)
            }
            OrganizerError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            OrganizerError::Config { .. } => Some(
                "Check your configuration file syntax, or regenerate one with --generate-config."
                    .to_string(),
            ),
            OrganizerError::Permission { .. } => Some(
                "Ensure you have read/write permissions for the photo directory.".to_string(),
            ),
            OrganizerError::InvalidRoot { .. } => Some(
                "Pass an existing directory, or run from inside the folder holding your photos."
                    .to_string(),
            ),
            OrganizerError::MetadataUnavailable { .. } => Some(
                "Install exiftool or point --metadata-tool at it; filesystem dates are used meanwhile."
                    .to_string(),
            ),
            OrganizerError::DestinationExists { .. } => Some(
                "Rename one of the files, or rerun with --on-collision rename.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for OrganizerError {
    fn from(error: toml::de::Error) -> Self {
        OrganizerError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrganizerError>;
