use std::path::{Path, PathBuf};

use crate::foundation::error::StepcastResult;
use crate::media::ffmpeg::FfmpegMerger;
use crate::media::tools::MediaTools;

/// Audio concatenation and audio/video combination.
///
/// Implementations are stateless between calls and may be shared across concurrent builds.
pub trait MediaMerger: Send + Sync {
    /// Stable name for logs.
    fn identity(&self) -> String;

    /// Join `inputs` in order into one continuous asset at `destination`.
    ///
    /// A single input is copied (or transcoded to the destination format) rather than concatenated.
    fn concatenate_audio(&self, inputs: &[PathBuf], destination: &Path) -> StepcastResult<PathBuf>;

    /// Combine `video` with `audio` into `destination`.
    ///
    /// The output length follows the audio: a shorter video holds its last frame, a longer one
    /// is trimmed.
    fn merge(&self, video: &Path, audio: &Path, destination: &Path) -> StepcastResult<PathBuf>;
}

/// Available merger implementations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MergerKind {
    /// System `ffmpeg` binary.
    #[default]
    Ffmpeg,
}

/// Construct a merger by kind.
pub fn create_merger(kind: MergerKind, tools: &MediaTools) -> StepcastResult<Box<dyn MediaMerger>> {
    match kind {
        MergerKind::Ffmpeg => Ok(Box::new(FfmpegMerger::new(tools.clone()))),
    }
}
