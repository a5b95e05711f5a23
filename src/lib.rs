//! Clipforge - trim, resize and re-encode media files through ffmpeg
//!
//! This library crate exposes the binary's configuration and reporting for
//! integration testing.

pub mod config;
pub mod report;
