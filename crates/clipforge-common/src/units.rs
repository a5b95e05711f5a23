//! Human-readable rendering of byte sizes and durations.

const SIZE_UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with 1024-based units and at most two decimals.
///
/// Trailing zeros are dropped: `1536` renders as `1.5 KB`, `2048` as `2 KB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

/// Render seconds as `m:ss`, or `h:mm:ss` once an hour is reached.
///
/// Fractional seconds are truncated; negative or non-finite input renders
/// as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Signed percentage change from `original` to `processed`.
///
/// Negative values mean the output shrank. Returns `None` when the original
/// size is zero.
pub fn size_change_percent(original: u64, processed: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    Some((processed as f64 / original as f64 - 1.0) * 100.0)
}
