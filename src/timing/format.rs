//! Duration formatting for classification rows

/// Rendered in place of any duration that is undefined or negative.
pub const UNAVAILABLE: &str = "—";

/// Format whole seconds as `H:MM:SS` from one hour up, else `M:SS`.
///
/// Negative durations render as [`UNAVAILABLE`].
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return UNAVAILABLE.to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Format an optional elapsed time.
pub fn format_elapsed(seconds: Option<i64>) -> String {
    seconds.map_or_else(|| UNAVAILABLE.to_string(), format_duration)
}

/// Format an optional gap to the leader with a leading `+`.
pub fn format_gap(seconds: Option<i64>) -> String {
    match seconds {
        Some(secs) if secs >= 0 => format!("+{}", format_duration(secs)),
        _ => UNAVAILABLE.to_string(),
    }
}
