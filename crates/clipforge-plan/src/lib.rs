//! clipforge-plan: deterministic transcode planning.
//!
//! Turns a declarative [`TranscodeRequest`] into an ordered ffmpeg argument
//! list ([`ArgumentPlan`]). No I/O happens here; the same request always
//! produces the same plan.
//!
//! - [`trim`]: effective output duration for a trim window
//! - [`bitrate`]: video bitrate for size-targeted output
//! - [`args`]: the argument builder
//! - [`resolution`]: output resolution presets
//!
//! # Example
//!
//! ```
//! use clipforge_common::TargetFormat;
//! use clipforge_plan::{TranscodeArgsBuilder, TranscodeRequest};
//!
//! let request = TranscodeRequest::new(300.0)
//!     .with_format(TargetFormat::Mkv)
//!     .with_target_size_mb(50.0);
//! let plan = TranscodeArgsBuilder::default()
//!     .build(&request, "input.mp4", "output.mkv")
//!     .unwrap();
//! assert_eq!(plan.video_bitrate_kbps, Some(1237));
//! ```

pub mod args;
pub mod bitrate;
pub mod request;
pub mod resolution;
pub mod trim;

pub use args::{ArgumentPlan, TranscodeArgsBuilder};
pub use bitrate::{estimate_video_bitrate, BitrateEstimator};
pub use request::{Compression, Resize, TranscodeRequest, TrimWindow};
pub use resolution::ResolutionPreset;
