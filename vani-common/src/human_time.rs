//! Player clock formatting
//!
//! Provides the `M:SS` display used next to the playback slider.

/// Format seconds as a player clock (`M:SS`).
///
/// Minutes are unbounded and seconds are zero-padded to two digits. Both
/// parts are computed by flooring (`seconds / 60` and `seconds % 60`), never
/// by rounding, so `59.9` still displays as `0:59`.
///
/// Non-finite input (NaN, an unknown duration, infinity) renders as `0:00`.
/// Negative input is treated as zero.
///
/// # Examples
///
/// ```
/// use vani_common::human_time::format_time;
///
/// assert_eq!(format_time(0.0), "0:00");
/// assert_eq!(format_time(65.0), "1:05");
/// assert_eq!(format_time(3599.0), "59:59");
/// assert_eq!(format_time(f64::NAN), "0:00");
/// ```
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}

/// Format an optional duration; `None` (not yet known) renders as `0:00`.
///
/// ```
/// use vani_common::human_time::format_time_opt;
///
/// assert_eq!(format_time_opt(Some(120.0)), "2:00");
/// assert_eq!(format_time_opt(None), "0:00");
/// ```
pub fn format_time_opt(seconds: Option<f64>) -> String {
    seconds.map(format_time).unwrap_or_else(|| format_time(f64::NAN))
}
