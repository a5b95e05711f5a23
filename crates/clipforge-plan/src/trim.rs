//! Effective output duration after trimming.

use clipforge_common::{Error, Result};

use crate::request::TrimWindow;

/// Duration of the output in seconds.
///
/// Without a trim window this is the full input `duration`. With one it is
/// `max(end, start) - start`, which must be positive.
///
/// # Errors
///
/// Returns [`Error::InvalidTrimWindow`] when the window is empty or inverted.
///
/// # Example
///
/// ```
/// use clipforge_plan::{trim, TrimWindow};
///
/// assert_eq!(trim::resolve(120.0, Some(&TrimWindow::new(10.0, 40.0))).unwrap(), 30.0);
/// assert_eq!(trim::resolve(120.0, None).unwrap(), 120.0);
/// ```
pub fn resolve(duration: f64, trim: Option<&TrimWindow>) -> Result<f64> {
    let Some(window) = trim else {
        return Ok(duration);
    };

    let span = window.end.max(window.start) - window.start;
    // NaN bounds fall through to the error as well.
    if span > 0.0 {
        Ok(span)
    } else {
        Err(Error::InvalidTrimWindow {
            start: window.start,
            end: window.end,
        })
    }
}
