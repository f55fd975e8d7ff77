use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use anyhow::{Context as _, bail};

use crate::foundation::config::ToolsConfig;

/// Paths of the ffmpeg binaries used for probing and muxing.
///
/// Defaults to `ffmpeg` / `ffprobe` resolved on `PATH`.
#[derive(Clone, Debug)]
pub struct MediaTools {
    /// `ffmpeg` binary.
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl From<&ToolsConfig> for MediaTools {
    fn from(cfg: &ToolsConfig) -> Self {
        Self {
            ffmpeg: cfg.ffmpeg.clone(),
            ffprobe: cfg.ffprobe.clone(),
        }
    }
}

impl MediaTools {
    /// Duration of a media file in seconds, read from the container via `ffprobe`.
    pub fn measure_duration(&self, path: &Path) -> anyhow::Result<f64> {
        #[derive(serde::Deserialize)]
        struct FfprobeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct FfprobeOut {
            format: Option<FfprobeFormat>,
        }

        if !path.is_file() {
            bail!("media file not found: '{}'", path.display());
        }

        let mut cmd = Command::new(&self.ffprobe);
        cmd.args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(path);
        let out = run_tool(&mut cmd, "ffprobe")?;

        let parsed: FfprobeOut =
            serde_json::from_slice(&out.stdout).context("ffprobe json parse failed")?;
        let duration = parsed
            .format
            .and_then(|f| f.duration)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .with_context(|| format!("ffprobe reported no duration for '{}'", path.display()))?;
        if !duration.is_finite() || duration <= 0.0 {
            bail!(
                "ffprobe reported non-positive duration {duration} for '{}'",
                path.display()
            );
        }
        Ok(duration)
    }

    /// Run `ffmpeg` with `-y -loglevel error` prepended to `args`.
    pub fn ffmpeg<I, S>(&self, args: I, what: &str) -> anyhow::Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-loglevel", "error"]).args(args);
        run_tool(&mut cmd, what)
    }
}

/// Run a prepared command to completion, turning spawn failures and non-zero exits into errors
/// that carry the tool's stderr.
pub fn run_tool(cmd: &mut Command, what: &str) -> anyhow::Result<Output> {
    tracing::debug!(command = ?cmd, "{what}");
    cmd.stdin(Stdio::null());
    let out = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "{what}: '{}' not found (is it installed and on PATH?)",
                cmd.get_program().to_string_lossy()
            )
        } else {
            anyhow::anyhow!("{what}: failed to spawn: {e}")
        }
    })?;
    if !out.status.success() {
        bail!(
            "{what} exited with status {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    Ok(out)
}

/// Whether `program -version` runs successfully.
pub fn is_tool_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Create the parent directory of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Lower-cased extension of `path`, without the dot.
pub(crate) fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
#[path = "../../tests/unit/media/tools.rs"]
mod tests;
