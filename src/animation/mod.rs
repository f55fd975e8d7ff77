//! Animation rendering port.
//!
//! A renderer turns a scene plus its measured [`TimingPlan`] into a self-contained artifact that a
//! [`crate::capture::VideoCapture`] can record. Step `i` is shown for exactly
//! `timing.durations()[i]` seconds.

use std::path::{Path, PathBuf};

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::scene::model::SceneSpec;
use crate::scene::timing::TimingPlan;

/// Self-contained HTML timeline.
pub mod html;

pub use html::HtmlAnimation;

/// Builds a playable animation artifact from a scene and its timing.
pub trait AnimationRenderer: Send + Sync {
    /// Stable name for logs.
    fn identity(&self) -> String;

    /// Write the artifact to `destination` and return its location.
    ///
    /// Fails with a render error, before touching the filesystem, when the timing plan and the
    /// scene disagree on the number of steps.
    fn render(
        &self,
        scene: &SceneSpec,
        timing: &TimingPlan,
        destination: &Path,
    ) -> StepcastResult<PathBuf>;
}

/// Available renderer implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum AnimationKind {
    /// Single HTML document with embedded data and timeline script.
    #[default]
    Html,
}

/// Construct a renderer by kind.
pub fn create_renderer(kind: AnimationKind) -> StepcastResult<Box<dyn AnimationRenderer>> {
    match kind {
        AnimationKind::Html => Ok(Box::new(HtmlAnimation::new())),
    }
}

/// Timing must cover every step exactly once.
pub(crate) fn check_alignment(scene: &SceneSpec, timing: &TimingPlan) -> StepcastResult<()> {
    if timing.len() != scene.steps.len() {
        return Err(StepcastError::render(format!(
            "timing has {} durations but scene '{}' has {} steps",
            timing.len(),
            scene.id,
            scene.steps.len()
        )));
    }
    Ok(())
}
