//! Named and custom output resolutions.

use std::fmt;
use std::str::FromStr;

use clipforge_common::Error;

use crate::request::Resize;

/// Common presets offered alongside custom sizes.
pub const COMMON_PRESETS: &[(&str, Resize)] = &[
    ("2160p", Resize { width: 3840, height: 2160 }),
    ("1440p", Resize { width: 2560, height: 1440 }),
    ("1080p", Resize { width: 1920, height: 1080 }),
    ("720p", Resize { width: 1280, height: 720 }),
    ("480p", Resize { width: 854, height: 480 }),
    ("360p", Resize { width: 640, height: 360 }),
];

/// A resolution choice: keep the source, or scale to a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolutionPreset {
    #[default]
    Original,
    Fixed(Resize),
}

impl ResolutionPreset {
    /// Custom width/height pair. Zero in either dimension means "keep the
    /// source", matching an unfilled custom field.
    pub fn custom(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            Self::Original
        } else {
            Self::Fixed(Resize::new(width, height))
        }
    }

    /// The resize to put on a request, if any.
    pub fn resize(self) -> Option<Resize> {
        match self {
            Self::Original => None,
            Self::Fixed(r) => Some(r),
        }
    }
}

impl fmt::Display for ResolutionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Fixed(r) => write!(f, "{r}"),
        }
    }
}

impl FromStr for ResolutionPreset {
    type Err = Error;

    /// Accepts `original`, a named preset such as `720p`, or `WxH` / `W:H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("original") {
            return Ok(Self::Original);
        }
        if let Some((_, r)) = COMMON_PRESETS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
        {
            return Ok(Self::Fixed(*r));
        }

        let (w, h) = s
            .split_once(['x', 'X', ':'])
            .ok_or_else(|| Error::invalid_request(format!("unrecognized resolution '{s}'")))?;
        let parse = |v: &str| {
            v.trim().parse::<u32>().map_err(|_| {
                Error::invalid_request(format!("invalid resolution dimension '{v}' in '{s}'"))
            })
        };
        Ok(Self::custom(parse(w)?, parse(h)?))
    }
}
