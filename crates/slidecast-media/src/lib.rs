//! FFmpeg CLI wrapper for slide video production.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Process execution with timeout and stderr capture
//! - Precise audio duration probing via FFprobe
//! - Still-image + narration segment encoding
//! - Stream-copy concatenation through the concat demuxer
//! - The `MediaEncoder` seam used by the worker

pub mod command;
pub mod concat;
pub mod encoder;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod segment;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_command, concat_segments, write_concat_manifest};
pub use encoder::{FfmpegEncoder, MediaEncoder};
pub use error::{MediaError, MediaResult};
pub use fs_utils::move_file;
pub use probe::probe_duration;
pub use segment::{build_segment_command, render_still_segment};
