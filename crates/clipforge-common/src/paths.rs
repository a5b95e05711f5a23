//! File-name helpers: extensions, output naming, and MIME guessing.

use crate::types::TargetFormat;

/// Known extensions and the MIME type the picker would report for them.
const MIME_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/mp4"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("ogg", "audio/ogg"),
    ("flac", "audio/flac"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// Extension of `name` including the leading dot (`".mp4"`), or `""` when the
/// name has none. A leading dot alone (`".bashrc"`) is not an extension.
///
/// # Examples
///
/// ```
/// use clipforge_common::paths::dotted_extension;
///
/// assert_eq!(dotted_extension("clip.final.mov"), ".mov");
/// assert_eq!(dotted_extension("README"), "");
/// ```
pub fn dotted_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}

/// `name` with its last extension removed.
///
/// # Examples
///
/// ```
/// use clipforge_common::paths::base_name;
///
/// assert_eq!(base_name("clip.final.mov"), "clip.final");
/// assert_eq!(base_name("README"), "README");
/// ```
pub fn base_name(name: &str) -> &str {
    let ext = dotted_extension(name);
    &name[..name.len() - ext.len()]
}

/// Download name for a processed file: `<base>_processed.<ext>`.
///
/// # Examples
///
/// ```
/// use clipforge_common::{paths::processed_file_name, TargetFormat};
///
/// assert_eq!(processed_file_name("holiday.mov", TargetFormat::Mp4), "holiday_processed.mp4");
/// ```
pub fn processed_file_name(original: &str, format: TargetFormat) -> String {
    format!("{}_processed.{}", base_name(original), format.extension())
}

/// Scratch-space name for the job input: `input` plus the original extension.
pub fn input_scratch_name(original: &str) -> String {
    format!("input{}", dotted_extension(original))
}

/// Scratch-space name for the job output: `output.<ext>`.
pub fn output_scratch_name(format: TargetFormat) -> String {
    format!("output.{}", format.extension())
}

/// Guess a MIME type from a file name's extension.
///
/// Unknown extensions map to `application/octet-stream`.
pub fn guess_mime_type(name: &str) -> &'static str {
    let ext = dotted_extension(name).trim_start_matches('.').to_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}
