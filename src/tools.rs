//! External tool detection for the transcription pipeline.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::anyhow;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version output.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Probe `program` by running it with `version_arg`.
pub fn check_tool_with_arg(name: &str, program: &Path, version_arg: &str) -> ToolInfo {
    let result = Command::new(program).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            // whisper-cli prints its help/version banner on stderr.
            let text = if output.stdout.is_empty() {
                &output.stderr
            } else {
                &output.stdout
            };
            let version = String::from_utf8_lossy(text)
                .lines()
                .find(|l| !l.trim().is_empty())
                .map(|s| s.trim().to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: which::which(program).ok(),
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check ffmpeg and whisper-cli, honouring configured paths.
pub fn check_tools(ffmpeg: Option<&Path>, whisper: Option<&Path>) -> Vec<ToolInfo> {
    let ffmpeg = ffmpeg.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("ffmpeg"));
    let whisper = whisper
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("whisper-cli"));

    vec![
        check_tool_with_arg("ffmpeg", &ffmpeg, "-version"),
        check_tool_with_arg("whisper-cli", &whisper, "--help"),
    ]
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, configured: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    which::which(name).map_err(|_| anyhow!("Required tool not found: {name}"))
}
