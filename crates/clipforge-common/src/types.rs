//! Media-domain enums and the picked-file value.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`),
//! implement `Display` manually, and parse case-insensitively via `FromStr`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::paths;
use crate::{Error, Result};

// ---------------------------------------------------------------------------
// TargetFormat
// ---------------------------------------------------------------------------

/// Output container selected by the user. Determines the codec branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    #[default]
    Mp4,
    Mov,
    Mkv,
    Webm,
    Avi,
}

impl TargetFormat {
    /// Every supported format, in UI order.
    pub const ALL: [TargetFormat; 5] = [Self::Mp4, Self::Mov, Self::Mkv, Self::Webm, Self::Avi];

    /// File extension (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Avi => "avi",
        }
    }

    /// MIME type of the produced file.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Mov => "video/quicktime",
            Self::Mkv => "video/x-matroska",
            Self::Webm => "video/webm",
            Self::Avi => "video/x-msvideo",
        }
    }

    /// Whether size-targeted compression has an argument mapping for this
    /// container.
    pub fn supports_size_targeting(self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov | Self::Mkv | Self::Webm)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for TargetFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mov" => Ok(Self::Mov),
            "mkv" => Ok(Self::Mkv),
            "webm" => Ok(Self::Webm),
            "avi" => Ok(Self::Avi),
            other => Err(Error::invalid_request(format!(
                "unknown target format '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// CompressionMode
// ---------------------------------------------------------------------------

/// How output size is controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Constant rate factor; lower is better quality.
    #[default]
    Quality,
    /// Bitrate derived from a target output size.
    Size,
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quality => write!(f, "quality"),
            Self::Size => write!(f, "size"),
        }
    }
}

impl FromStr for CompressionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "size" => Ok(Self::Size),
            other => Err(Error::invalid_request(format!(
                "unknown compression mode '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Broad media category, used to filter picked files by MIME prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Image,
}

impl MediaKind {
    /// MIME prefix for this kind, including the trailing slash.
    pub fn mime_prefix(self) -> &'static str {
        match self {
            Self::Video => "video/",
            Self::Audio => "audio/",
            Self::Image => "image/",
        }
    }

    /// Whether a file with the given MIME type belongs to this kind.
    pub fn accepts(self, mime_type: &str) -> bool {
        mime_type
            .to_ascii_lowercase()
            .starts_with(self.mime_prefix())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Image => write!(f, "image"),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaFile
// ---------------------------------------------------------------------------

/// A user-selected media file, as handed over by the file-picking surface.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaFile {
    /// Original file name, including extension.
    pub name: String,
    /// Size of `bytes` in bytes.
    pub size_bytes: u64,
    /// MIME type reported by the picker (or guessed from the extension).
    pub mime_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// Build a media file from an in-memory buffer.
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_request(format!("not a file: {}", path.display())))?;
        let mime_type = paths::guess_mime_type(&name).to_string();
        Ok(Self::new(name, mime_type, bytes))
    }

    /// The file's extension including the leading dot, or an empty string.
    pub fn extension(&self) -> &str {
        paths::dotted_extension(&self.name)
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}
