//! Media plumbing around the system `ffmpeg` / `ffprobe` binaries.

/// `ffmpeg`-backed merger.
pub mod ffmpeg;
/// Merge port and factory.
pub mod merge;
/// Subprocess helpers and duration probing.
pub mod tools;
