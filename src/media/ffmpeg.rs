use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::error::{StepcastError, StepcastResult};
use crate::media::merge::MediaMerger;
use crate::media::tools::{MediaTools, ensure_parent_dir, extension_of};

/// Holds the last video frame for as long as the audio keeps going.
const HOLD_LAST_FRAME_FILTER: &str = "[0:v]tpad=stop_mode=clone:stop=-1[v]";

/// [`MediaMerger`] backed by the system `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegMerger {
    tools: MediaTools,
    audio_codec: String,
    video_codec: String,
}

impl FfmpegMerger {
    /// Create a merger using AAC audio and H.264 video.
    pub fn new(tools: MediaTools) -> Self {
        Self {
            tools,
            audio_codec: "aac".to_string(),
            video_codec: "libx264".to_string(),
        }
    }

    /// Tool paths in use.
    pub fn tools(&self) -> &MediaTools {
        &self.tools
    }
}

impl MediaMerger for FfmpegMerger {
    fn identity(&self) -> String {
        format!("ffmpeg({})", self.tools.ffmpeg.display())
    }

    fn concatenate_audio(&self, inputs: &[PathBuf], destination: &Path) -> StepcastResult<PathBuf> {
        if inputs.is_empty() {
            return Err(StepcastError::merge("no audio inputs to concatenate"));
        }
        for input in inputs {
            if !input.is_file() {
                return Err(StepcastError::merge(format!(
                    "audio file not found: '{}'",
                    input.display()
                )));
            }
        }
        ensure_parent_dir(destination).map_err(|e| StepcastError::merge(format!("{e:#}")))?;

        let copy = can_stream_copy(inputs, destination);
        if let [single] = inputs {
            tracing::debug!(
                input = %single.display(),
                out = %destination.display(),
                copy,
                "single audio input, skipping concat"
            );
            let args = single_input_args(single, destination, copy, &self.audio_codec);
            self.tools
                .ffmpeg(args, "ffmpeg audio copy")
                .map_err(|e| StepcastError::merge(format!("{e:#}")))?;
            return Ok(destination.to_path_buf());
        }

        let list_path = concat_list_path(destination);
        std::fs::write(&list_path, concat_list(inputs)?)
            .with_context(|| format!("write concat list '{}'", list_path.display()))
            .map_err(|e| StepcastError::merge(format!("{e:#}")))?;

        let args = concat_args(&list_path, destination, copy, &self.audio_codec);
        let res = self.tools.ffmpeg(args, "ffmpeg audio concat");
        let _ = std::fs::remove_file(&list_path);
        res.map_err(|e| StepcastError::merge(format!("{e:#}")))?;

        Ok(destination.to_path_buf())
    }

    fn merge(&self, video: &Path, audio: &Path, destination: &Path) -> StepcastResult<PathBuf> {
        if !video.is_file() {
            return Err(StepcastError::merge(format!(
                "video file not found: '{}'",
                video.display()
            )));
        }
        if !audio.is_file() {
            return Err(StepcastError::merge(format!(
                "audio file not found: '{}'",
                audio.display()
            )));
        }
        ensure_parent_dir(destination).map_err(|e| StepcastError::merge(format!("{e:#}")))?;

        let audio_sec = self
            .tools
            .measure_duration(audio)
            .map_err(|e| StepcastError::merge(format!("cannot read audio track: {e:#}")))?;

        let args = merge_args(
            video,
            audio,
            destination,
            audio_sec,
            &self.video_codec,
            &self.audio_codec,
        );
        self.tools
            .ffmpeg(args, "ffmpeg merge")
            .map_err(|e| StepcastError::merge(format!("{e:#}")))?;
        Ok(destination.to_path_buf())
    }
}

/// Stream copy only works when every input already has the destination's container format.
fn can_stream_copy(inputs: &[PathBuf], destination: &Path) -> bool {
    let Some(out_ext) = extension_of(destination) else {
        return false;
    };
    inputs
        .iter()
        .all(|p| extension_of(p).as_deref() == Some(out_ext.as_str()))
}

fn concat_list_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("audio"));
    name.push(".concat.txt");
    destination.with_file_name(name)
}

/// Concat demuxer list with absolute, single-quote-escaped paths.
fn concat_list(inputs: &[PathBuf]) -> StepcastResult<String> {
    let mut out = String::new();
    for input in inputs {
        let abs = std::path::absolute(input)
            .with_context(|| format!("resolve '{}'", input.display()))
            .map_err(|e| StepcastError::merge(format!("{e:#}")))?;
        let escaped = abs.to_string_lossy().replace('\'', r"'\''");
        out.push_str(&format!("file '{escaped}'\n"));
    }
    Ok(out)
}

fn single_input_args(input: &Path, out: &Path, copy: bool, audio_codec: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into(), "-vn".into()];
    if copy {
        args.extend(["-c", "copy"].map(OsString::from));
    } else {
        args.extend(["-c:a", audio_codec].map(OsString::from));
    }
    args.push(out.into());
    args
}

fn concat_args(list: &Path, out: &Path, copy: bool, audio_codec: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        list.into(),
        "-vn".into(),
    ];
    if copy {
        args.extend(["-c", "copy"].map(OsString::from));
    } else {
        args.extend(["-c:a", audio_codec].map(OsString::from));
    }
    args.push(out.into());
    args
}

fn merge_args(
    video: &Path,
    audio: &Path,
    out: &Path,
    audio_sec: f64,
    video_codec: &str,
    audio_codec: &str,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-i".into(), audio.into()];
    for a in [
        "-filter_complex",
        HOLD_LAST_FRAME_FILTER,
        "-map",
        "[v]",
        "-map",
        "1:a",
        "-c:v",
        video_codec,
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        audio_codec,
        "-shortest",
        "-movflags",
        "+faststart",
        "-t",
    ] {
        args.push(a.into());
    }
    args.push(format!("{audio_sec:.6}").into());
    args.push(out.into());
    args
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
