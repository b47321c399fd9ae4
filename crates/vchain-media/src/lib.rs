//! FFmpeg CLI wrapper for chained video work.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Cancellation and timeout support via tokio
//! - The [`Splicer`] capability: extract the last frame, reverse, concatenate
//! - Concat demuxer manifests and small filesystem helpers

pub mod command;
pub mod error;
pub mod fs_utils;
pub mod manifest;
pub mod splicer;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use manifest::ConcatManifest;
pub use splicer::{FfmpegSplicer, Splicer};
