//! Display helpers for countdown values.

/// `HH:MM:SS`, hours not capped at 24.
pub fn format_hms(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Coarse duration such as `1h 30m`; `< 1m` under a minute, `—` for nothing.
pub fn format_duration(secs: u64) -> String {
    if secs == 0 {
        return "—".to_string();
    }
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if parts.is_empty() {
        "< 1m".to_string()
    } else {
        parts.join(" ")
    }
}
