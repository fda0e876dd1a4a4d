//! Formatting helpers for sizes, durations and bit rates.
//!
//! Used by the CLI's text output and available to library callers that want
//! the same rendering.

/// Formats bytes with 1024-based units (e.g., 1536 -> "1.50 KB").
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;

    let value = bytes as f64;
    if value >= TB {
        format!("{:.2} TB", value / TB)
    } else if value >= GB {
        format!("{:.2} GB", value / GB)
    } else if value >= MB {
        format!("{:.2} MB", value / MB)
    } else if value >= KB {
        format!("{:.2} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats milliseconds as "S.mmm", "M:SS.mmm" or "H:MM:SS.mmm",
/// using the shortest form that fits (e.g., 83_250 -> "1:23.250").
#[must_use]
pub fn format_duration_ms(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}.{millis:03}")
    } else if minutes > 0 {
        format!("{minutes}:{seconds:02}.{millis:03}")
    } else {
        format!("{seconds}.{millis:03}")
    }
}

/// Formats a bit rate in bits per second (e.g., 128_000 -> "128 kb/s").
/// Returns "N/A" for rates that are zero or negative.
#[must_use]
pub fn format_bit_rate(bits_per_second: i64) -> String {
    if bits_per_second <= 0 {
        "N/A".to_string()
    } else if bits_per_second >= 1_000_000 {
        format!("{:.2} Mb/s", bits_per_second as f64 / 1_000_000.0)
    } else {
        format!("{} kb/s", bits_per_second / 1000)
    }
}
