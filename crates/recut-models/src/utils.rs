//! Human-readable formatting helpers shared across crates.

/// Format a byte count as a human-readable string.
///
/// # Examples
/// ```
/// use recut_models::format_bytes;
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(8 * 1024 * 1024), "8.0 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a remaining-time estimate for display.
///
/// Estimates at or below zero render as "finalizing" rather than a
/// countdown; a negative countdown is never shown.
pub fn format_eta(seconds_remaining: f64) -> String {
    if seconds_remaining <= 0.0 {
        return "finalizing".to_string();
    }

    let secs = seconds_remaining.round() as u64;
    if secs >= 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(300 * 1024 * 1024), "300.0 MB");
        assert_eq!(format_bytes(2 * 1024 * 1024 * 1024), "2.00 GB");
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(-3.0), "finalizing");
        assert_eq!(format_eta(0.0), "finalizing");
        assert_eq!(format_eta(42.4), "42s");
        assert_eq!(format_eta(95.0), "1m 35s");
        assert_eq!(format_eta(3700.0), "1h 1m");
    }
}
