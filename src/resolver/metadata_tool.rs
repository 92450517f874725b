use crate::config::MetadataConfig;
use crate::error::{OrganizerError, Result};
use crate::resolver::{DateResolver, DateSource, ResolvedDate};
use chrono::NaiveDateTime;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::trace;

const CAPTURE_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Reads the capture date by running an external metadata tool (exiftool by default).
pub struct MetadataToolResolver {
    program: String,
    args: Vec<String>,
    tag: String,
}

impl MetadataToolResolver {
    pub fn new(config: &MetadataConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            tag: config.tag.clone(),
        }
    }

    /// Expands `{tag}` and `{path}` in the configured arguments.
    fn build_args(&self, path: &Path) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if arg == "{path}" {
                    // Passed through untouched so non-UTF-8 names survive
                    path.as_os_str().to_os_string()
                } else {
                    OsString::from(
                        arg.replace("{tag}", &self.tag)
                            .replace("{path}", &path.to_string_lossy()),
                    )
                }
            })
            .collect()
    }
}

impl DateResolver for MetadataToolResolver {
    fn resolve(&self, path: &Path) -> Result<ResolvedDate> {
        let mut command = Command::new(&self.program);
        command.args(self.build_args(path)).stdin(Stdio::null());

        // Own process group, so a terminal Ctrl+C reaches only us and the
        // tool still reports the date for the file in progress.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let output = command
            .output()
            .map_err(|e| OrganizerError::MetadataUnavailable {
                message: format!("failed to run {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(OrganizerError::MetadataUnavailable {
                message: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(path = %path.display(), output = %stdout.trim(), "metadata tool output");

        let datetime = parse_capture_date(&stdout)?;
        Ok(ResolvedDate::new(datetime, DateSource::Metadata))
    }

    fn name(&self) -> &'static str {
        "metadata-tool"
    }
}

/// Parses `YYYY:MM:DD HH:MM:SS` from the first non-empty line of tool output.
pub fn parse_capture_date(output: &str) -> Result<NaiveDateTime> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    NaiveDateTime::parse_from_str(line, CAPTURE_DATE_FORMAT).map_err(|_| {
        OrganizerError::MetadataUnparseable {
            output: line.to_string(),
        }
    })
}
