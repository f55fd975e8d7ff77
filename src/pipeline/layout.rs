use std::path::{Path, PathBuf};

/// Intermediate-map key of the timing record.
pub const KEY_TIMING: &str = "timing";
/// Intermediate-map key of the rendered animation.
pub const KEY_ANIMATION: &str = "animation";
/// Intermediate-map key of the captured video.
pub const KEY_VIDEO: &str = "video";
/// Intermediate-map key of the concatenated narration.
pub const KEY_AUDIO_CONCAT: &str = "audio_concat";
/// Intermediate-map key of the final asset.
pub const KEY_FINAL: &str = "final";

/// Deterministic artifact paths for one scene, all below `<output_dir>/<scene_id>/`.
///
/// Names depend only on the scene id, step index/id and stage, so concurrent builds of different
/// scenes never share a path and a rebuild overwrites its previous outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    /// Layout for `scene_id` under `output_dir`.
    pub fn new(output_dir: &Path, scene_id: &str) -> Self {
        Self {
            root: output_dir.join(sanitize_component(scene_id)),
        }
    }

    /// Scene directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding per-step audio.
    pub fn audio_dir(&self) -> PathBuf {
        self.root.join("audio")
    }

    /// `audio/<NNN>_<step id>.<ext>`; the index prefix keeps files in step order.
    pub fn step_audio(&self, index: usize, step_id: &str, ext: &str) -> PathBuf {
        self.audio_dir()
            .join(format!("{index:03}_{}.{ext}", sanitize_component(step_id)))
    }

    /// `audio/<NNN>_<step id>.narration`: the text the step's audio was spoken from.
    pub fn step_narration(&self, index: usize, step_id: &str) -> PathBuf {
        self.step_audio(index, step_id, "narration")
    }

    /// `timing.json`.
    pub fn timing(&self) -> PathBuf {
        self.root.join("timing.json")
    }

    /// `animation.html`.
    pub fn animation(&self) -> PathBuf {
        self.root.join("animation.html")
    }

    /// `capture.mp4`.
    pub fn video(&self) -> PathBuf {
        self.root.join("capture.mp4")
    }

    /// `narration.m4a`.
    pub fn audio_concat(&self) -> PathBuf {
        self.root.join("narration.m4a")
    }

    /// `final.mp4`.
    pub fn final_output(&self) -> PathBuf {
        self.root.join("final.mp4")
    }

    /// Outputs of every stage after synthesis, in stage order.
    pub fn stage_outputs(&self) -> [PathBuf; 5] {
        [
            self.timing(),
            self.animation(),
            self.video(),
            self.audio_concat(),
            self.final_output(),
        ]
    }
}

/// Intermediate-map key of a step's audio.
pub fn audio_key(step_id: &str) -> String {
    format!("audio/{step_id}")
}

/// Map anything outside `[A-Za-z0-9._-]` to `_`; never empty, never a dot-only name.
pub fn sanitize_component(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.chars().all(|c| c == '.') {
        out = out.replace('.', "_");
        if out.is_empty() {
            out.push('_');
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/layout.rs"]
mod tests;
