/// Formats a duration in seconds as `H:MM:SS` from one hour up, otherwise `M:SS`.
///
/// Missing or zero durations (live streams, unknown lengths) render as `Unknown`.
pub fn format_duration(seconds: Option<u64>) -> String {
    let seconds = match seconds {
        Some(s) if s > 0 => s,
        _ => return "Unknown".to_string(),
    };

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Formats a view count with `M`/`K` suffixes, one decimal place.
pub fn format_views(views: Option<u64>) -> String {
    let views = match views {
        Some(v) if v > 0 => v,
        _ => return "0".to_string(),
    };

    if views >= 1_000_000 {
        format!("{:.1}M views", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K views", views as f64 / 1_000.0)
    } else {
        format!("{views} views")
    }
}
