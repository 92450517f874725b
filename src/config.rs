use crate::error::{OrganizerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File names searched for in the root directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["photo-organizer.toml", ".photo-organizer.toml"];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub metadata: MetadataConfig,
    pub placement: PlacementConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub follow_links: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub enabled: bool,
    pub program: String,
    pub args: Vec<String>,
    pub tag: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub on_collision: CollisionPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Leave the file where it is and count it as an error
    #[default]
    Skip,
    /// Move under the first free "name (N).ext"
    Rename,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            follow_links: false,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "exiftool".to_string(),
            args: vec![
                "-s3".to_string(),
                "-{tag}".to_string(),
                "{path}".to_string(),
            ],
            tag: "DateTimeOriginal".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(OrganizerError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| OrganizerError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| OrganizerError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    /// Loads an explicit config file, or the first default file found in `root`.
    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>, root: &Path) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                for name in DEFAULT_CONFIG_FILES {
                    let candidate = root.join(name);
                    if candidate.is_file() {
                        return Self::load_from_file(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref program) = cli_args.metadata_tool {
            self.metadata.program = program.clone();
        }

        if cli_args.no_metadata {
            self.metadata.enabled = false;
        }

        if let Some(policy) = cli_args.on_collision {
            self.placement.on_collision = policy;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan.max_depth == 0 {
            return Err(OrganizerError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        if self.metadata.enabled {
            if self.metadata.program.trim().is_empty() {
                return Err(OrganizerError::Config {
                    message: "Metadata tool program must not be empty".to_string(),
                });
            }

            if self.metadata.tag.trim().is_empty() {
                return Err(OrganizerError::Config {
                    message: "Metadata tag must not be empty".to_string(),
                });
            }

            if !self.metadata.args.iter().any(|arg| arg.contains("{path}")) {
                return Err(OrganizerError::Config {
                    message: "Metadata tool arguments must include the {path} placeholder"
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub metadata_tool: Option<String>,
    pub no_metadata: bool,
    pub on_collision: Option<CollisionPolicy>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata_tool(mut self, program: Option<String>) -> Self {
        self.metadata_tool = program;
        self
    }

    pub fn with_no_metadata(mut self, disabled: bool) -> Self {
        self.no_metadata = disabled;
        self
    }

    pub fn with_on_collision(mut self, policy: Option<CollisionPolicy>) -> Self {
        self.on_collision = policy;
        self
    }
}

/// Default location for `--generate-config` output.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILES[0])
}
