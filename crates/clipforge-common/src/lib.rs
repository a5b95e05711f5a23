//! clipforge-common: shared types, errors, and utilities.
//!
//! This crate provides common functionality used across clipforge:
//!
//! - **Errors**: the [`Error`] taxonomy and [`Result`] alias
//! - **Media types**: [`TargetFormat`], [`CompressionMode`], [`MediaKind`], [`MediaFile`]
//! - **Path utilities**: output naming and MIME guessing ([`paths`])
//! - **Units**: human-readable sizes and durations ([`units`])
//!
//! # Examples
//!
//! ```
//! use clipforge_common::{paths::processed_file_name, MediaKind, TargetFormat};
//!
//! assert!(MediaKind::Video.accepts("video/webm"));
//! assert_eq!(processed_file_name("clip.mov", TargetFormat::Webm), "clip_processed.webm");
//! ```

pub mod error;
pub mod paths;
pub mod types;
pub mod units;

pub use error::{Error, Result};
pub use types::*;
