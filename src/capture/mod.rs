//! Video capture port.
//!
//! A capture records a rendered animation artifact into a silent video. Adapters capture slightly
//! longer than the animation (see [`CAPTURE_SAFETY_MARGIN_SEC`]); the merge stage trims to the
//! narration length afterwards.

use std::path::{Path, PathBuf};

use crate::foundation::error::StepcastResult;

/// Headless Chromium driven through its command line.
pub mod chromium;

pub use chromium::{ChromiumCapture, ChromiumCaptureOpts};

/// Extra seconds recorded past the animation's total duration.
pub const CAPTURE_SAFETY_MARGIN_SEC: f64 = 0.5;

/// Records an animation artifact into a video file.
pub trait VideoCapture: Send + Sync {
    /// Stable name for logs.
    fn identity(&self) -> String;

    /// Record `artifact` for at least `total_duration` seconds into `destination`.
    ///
    /// Fails with a capture error when the artifact never signals readiness or does not report
    /// the expected duration.
    fn capture(
        &self,
        artifact: &Path,
        total_duration: f64,
        destination: &Path,
    ) -> StepcastResult<PathBuf>;
}

/// Available capture implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CaptureKind {
    /// Headless Chromium.
    #[default]
    Chromium,
}

/// Construct a capture by kind.
pub fn create_capture(
    kind: CaptureKind,
    opts: ChromiumCaptureOpts,
) -> StepcastResult<Box<dyn VideoCapture>> {
    match kind {
        CaptureKind::Chromium => Ok(Box::new(ChromiumCapture::new(opts)?)),
    }
}

/// Seconds actually recorded for an animation of `total_duration` seconds.
pub fn capture_seconds(total_duration: f64) -> f64 {
    total_duration + CAPTURE_SAFETY_MARGIN_SEC
}

/// Frames sampled at `fps` to cover [`capture_seconds`].
pub fn frame_count(total_duration: f64, fps: u32) -> u64 {
    let exact = capture_seconds(total_duration) * f64::from(fps);
    // Absorb float noise such as 70.00000000001 before rounding up.
    (exact - 1e-9).ceil().max(1.0) as u64
}

#[cfg(test)]
#[path = "../../tests/unit/capture/mod.rs"]
mod tests;
