use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use rayon::prelude::*;

use crate::animation::html::format_seconds;
use crate::capture::{VideoCapture, capture_seconds, frame_count};
use crate::foundation::config::{CaptureConfig, ToolsConfig};
use crate::foundation::error::{StepcastError, StepcastResult};
use crate::foundation::threads::build_thread_pool;
use crate::media::tools::{MediaTools, ensure_parent_dir, run_tool};

const READY_MARKER: &str = r#"data-animation-ready="true""#;
const DURATION_ATTR: &str = r#"data-animation-duration=""#;
const FRAME_PATTERN: &str = "frame_%06d.png";

/// Options for [`ChromiumCapture`].
#[derive(Clone, Debug)]
pub struct ChromiumCaptureOpts {
    /// Chromium / Chrome binary.
    pub chromium: PathBuf,
    /// ffmpeg used to encode the sampled frames.
    pub tools: MediaTools,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Sampling rate.
    pub fps: u32,
    /// Virtual time budget per sampled frame.
    pub frame_settle_ms: u64,
    /// Virtual time budget for the readiness check.
    pub ready_budget_ms: u64,
    /// Worker threads for frame sampling. `None` uses rayon's default.
    pub threads: Option<usize>,
    /// Pass `--no-sandbox`.
    pub no_sandbox: bool,
}

impl Default for ChromiumCaptureOpts {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default(), &CaptureConfig::default())
    }
}

impl ChromiumCaptureOpts {
    /// Options from the `[tools]` and `[capture]` config sections.
    pub fn from_config(tools: &ToolsConfig, capture: &CaptureConfig) -> Self {
        Self {
            chromium: tools.chromium.clone(),
            tools: MediaTools::from(tools),
            width: capture.width,
            height: capture.height,
            fps: capture.fps,
            frame_settle_ms: capture.frame_settle_ms,
            ready_budget_ms: capture.ready_budget_ms,
            threads: capture.threads,
            no_sandbox: capture.no_sandbox,
        }
    }
}

/// Captures an HTML animation by sampling it with headless Chromium.
///
/// The page is first loaded once to check the ready and duration signals. Frame `k` is then
/// screenshotted at `#t=k/fps`, so each frame shows the exact timeline state regardless of how
/// long the browser takes. The frames are encoded to H.264 with ffmpeg.
#[derive(Debug)]
pub struct ChromiumCapture {
    opts: ChromiumCaptureOpts,
}

impl ChromiumCapture {
    /// Validate `opts` and build the capture.
    pub fn new(opts: ChromiumCaptureOpts) -> StepcastResult<Self> {
        if opts.width == 0 || opts.height == 0 || opts.fps == 0 {
            return Err(StepcastError::config(
                "capture width, height and fps must be non-zero",
            ));
        }
        if !opts.width.is_multiple_of(2) || !opts.height.is_multiple_of(2) {
            return Err(StepcastError::config(
                "capture width/height must be even (required for yuv420p output)",
            ));
        }
        if opts.threads == Some(0) {
            return Err(StepcastError::config("capture threads must be >= 1 when set"));
        }
        Ok(Self { opts })
    }

    fn base_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--headless=new".into(),
            "--disable-gpu".into(),
            "--hide-scrollbars".into(),
            "--mute-audio".into(),
            "--no-first-run".into(),
        ];
        if self.opts.no_sandbox {
            args.push("--no-sandbox".into());
        }
        args
    }

    fn readiness_args(&self, url: &str) -> Vec<OsString> {
        let mut args = self.base_args();
        args.push(format!("--virtual-time-budget={}", self.opts.ready_budget_ms).into());
        args.push("--dump-dom".into());
        args.push(format!("{url}#t=0").into());
        args
    }

    fn screenshot_args(&self, url: &str, at_sec: f64, out: &Path) -> Vec<OsString> {
        let mut args = self.base_args();
        args.push(format!("--window-size={},{}", self.opts.width, self.opts.height).into());
        args.push(format!("--virtual-time-budget={}", self.opts.frame_settle_ms).into());
        let mut shot = OsString::from("--screenshot=");
        shot.push(out);
        args.push(shot);
        args.push(format!("{url}#t={at_sec:.4}").into());
        args
    }

    fn encode_args(&self, frames_dir: &Path, frames: u64, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-start_number".into(),
            "0".into(),
            "-framerate".into(),
            self.opts.fps.to_string().into(),
            "-i".into(),
            frames_dir.join(FRAME_PATTERN).into(),
            "-frames:v".into(),
            frames.to_string().into(),
        ];
        for a in [
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ] {
            args.push(a.into());
        }
        args.push(destination.into());
        args
    }

    fn check_ready(&self, url: &str, total_duration: f64) -> StepcastResult<()> {
        let mut cmd = Command::new(&self.opts.chromium);
        cmd.args(self.readiness_args(url));
        let out = run_tool(&mut cmd, "chromium readiness check")
            .map_err(|e| StepcastError::capture(format!("{e:#}")))?;
        let dom = String::from_utf8_lossy(&out.stdout);
        check_signals(&dom, total_duration).map_err(StepcastError::capture)
    }

    fn sample_frames(&self, url: &str, frames_dir: &Path, frames: u64) -> StepcastResult<()> {
        let pool = build_thread_pool(self.opts.threads, "capture")?;
        let fps = f64::from(self.opts.fps);
        let results: Vec<StepcastResult<()>> = pool.install(|| {
            (0..frames)
                .into_par_iter()
                .map(|k| {
                    let out = frames_dir.join(format!("frame_{k:06}.png"));
                    let mut cmd = Command::new(&self.opts.chromium);
                    cmd.args(self.screenshot_args(url, k as f64 / fps, &out));
                    run_tool(&mut cmd, "chromium screenshot")
                        .map_err(|e| StepcastError::capture(format!("frame {k}: {e:#}")))?;
                    if !out.is_file() {
                        return Err(StepcastError::capture(format!(
                            "frame {k}: chromium wrote no screenshot"
                        )));
                    }
                    Ok(())
                })
                .collect()
        });
        results.into_iter().collect()
    }
}

impl VideoCapture for ChromiumCapture {
    fn identity(&self) -> String {
        format!("chromium({})", self.opts.chromium.display())
    }

    #[tracing::instrument(skip_all, fields(artifact = %artifact.display()))]
    fn capture(
        &self,
        artifact: &Path,
        total_duration: f64,
        destination: &Path,
    ) -> StepcastResult<PathBuf> {
        if !total_duration.is_finite() || total_duration <= 0.0 {
            return Err(StepcastError::capture(format!(
                "invalid animation duration {total_duration}"
            )));
        }
        if !artifact.is_file() {
            return Err(StepcastError::capture(format!(
                "animation artifact not found: '{}'",
                artifact.display()
            )));
        }
        ensure_parent_dir(destination).map_err(|e| StepcastError::capture(format!("{e:#}")))?;

        let abs = std::path::absolute(artifact).map_err(|e| {
            StepcastError::capture(format!("resolve '{}': {e}", artifact.display()))
        })?;
        let url = file_url(&abs);

        self.check_ready(&url, total_duration)?;

        let frames = frame_count(total_duration, self.opts.fps);
        let frames_dir = frames_dir_for(destination);
        if frames_dir.exists() {
            std::fs::remove_dir_all(&frames_dir).map_err(|e| {
                StepcastError::capture(format!("clear '{}': {e}", frames_dir.display()))
            })?;
        }
        std::fs::create_dir_all(&frames_dir).map_err(|e| {
            StepcastError::capture(format!("create '{}': {e}", frames_dir.display()))
        })?;

        tracing::info!(
            frames,
            fps = self.opts.fps,
            seconds = capture_seconds(total_duration),
            "sampling frames"
        );
        self.sample_frames(&url, &frames_dir, frames)?;

        let args = self.encode_args(&frames_dir, frames, destination);
        self.opts
            .tools
            .ffmpeg(args, "ffmpeg frame encode")
            .map_err(|e| StepcastError::capture(format!("{e:#}")))?;

        if let Err(e) = std::fs::remove_dir_all(&frames_dir) {
            tracing::warn!(dir = %frames_dir.display(), "failed to remove frames: {e}");
        }
        if !destination.is_file() {
            return Err(StepcastError::capture(format!(
                "video was not created at '{}'",
                destination.display()
            )));
        }
        Ok(destination.to_path_buf())
    }
}

/// `<dest stem>_frames` next to the destination.
fn frames_dir_for(destination: &Path) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "capture".to_string());
    destination.with_file_name(format!("{stem}_frames"))
}

/// Verify the dumped DOM carries the ready flag and the expected duration.
fn check_signals(dom: &str, total_duration: f64) -> Result<(), String> {
    let root = root_start_tag(dom)
        .ok_or_else(|| "dumped page has no <html> element".to_string())?;
    if !root.contains(READY_MARKER) {
        return Err("animation never signalled readiness".to_string());
    }
    let start = root
        .find(DURATION_ATTR)
        .map(|at| at + DURATION_ATTR.len())
        .ok_or_else(|| "animation did not report its duration".to_string())?;
    let raw = root[start..]
        .split('"')
        .next()
        .unwrap_or_default();
    let reported: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("animation reported an unreadable duration {raw:?}"))?;
    let expected = format_seconds(total_duration);
    if format_seconds(reported) != expected {
        return Err(format!(
            "animation reports duration {raw}s but the timing plan totals {expected}s"
        ));
    }
    Ok(())
}

/// The `<html ...>` start tag. Signals live only there; page text may quote them.
fn root_start_tag(dom: &str) -> Option<&str> {
    let start = dom.find("<html")?;
    let len = dom[start..].find('>')?;
    Some(&dom[start..start + len])
}

/// `file://` URL with everything outside the unreserved set (and `/`) percent-encoded.
fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let mut out = String::from("file://");
    for b in raw.as_bytes() {
        match *b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(*b as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/capture/chromium.rs"]
mod tests;
