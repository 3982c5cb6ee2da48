//! Human-readable time formatting
//!
//! Consistent rendering of millisecond durations and offsets in log lines and
//! operator-facing output. Values are signed: offsets and countdowns go
//! negative when the show runs late or into overtime.

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Values below this render as `M:SS.s`
const MEDIUM_FORMAT_MAX: i64 = MILLIS_PER_HOUR;

/// Format milliseconds as a signed clock string.
///
/// - under one hour: `M:SS.s`
/// - one hour and above: `H:MM:SS`
///
/// # Examples
///
/// ```
/// use rundown_common::human_time::format_millis;
///
/// assert_eq!(format_millis(0), "0:00.0");
/// assert_eq!(format_millis(330_000), "5:30.0");
/// assert_eq!(format_millis(-180_000), "-3:00.0");
/// assert_eq!(format_millis(3_661_000), "1:01:01");
/// ```
pub fn format_millis(millis: i64) -> String {
    let is_negative = millis < 0;
    let abs_millis = millis.unsigned_abs() as i64;

    let formatted = if abs_millis < MEDIUM_FORMAT_MAX {
        let minutes = abs_millis / MILLIS_PER_MINUTE;
        // Truncate to tenths so 59.96s never renders as 60.0
        let tenths = (abs_millis % MILLIS_PER_MINUTE) / 100;
        format!("{}:{:02}.{}", minutes, tenths / 10, tenths % 10)
    } else {
        let hours = abs_millis / MILLIS_PER_HOUR;
        let mins = (abs_millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
        let secs = (abs_millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    };

    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format an offset with an explicit sign and direction word.
///
/// Positive offsets mean the show is running behind plan.
///
/// ```
/// use rundown_common::human_time::format_offset;
///
/// assert_eq!(format_offset(0), "on time");
/// assert_eq!(format_offset(90_000), "+1:30.0 behind");
/// assert_eq!(format_offset(-5_000), "-0:05.0 ahead");
/// ```
pub fn format_offset(offset_ms: i64) -> String {
    match offset_ms {
        0 => "on time".to_string(),
        o if o > 0 => format!("+{} behind", format_millis(o)),
        o => format!("{} ahead", format_millis(o)),
    }
}
