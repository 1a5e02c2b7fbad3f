//! Display formatting for listing rows.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with binary (1024-based) units, one decimal place.
/// Zero is special-cased so empty files render as `0 B` rather than `0.0 B`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    for unit in UNITS {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} PB")
}

/// Render the service's 14-digit `YYYYMMDDHHMMSS` create time as
/// `YYYY-MM-DD HH:MM`.
///
/// Anything that is not exactly 14 characters renders empty. A 14-character
/// value with non-digit characters is shown as-is, matching how the service's
/// own clients degrade on malformed timestamps.
pub fn format_create_time(digits: &str) -> String {
    if digits.len() != 14 {
        return String::new();
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return digits.to_string();
    }

    format!(
        "{}-{}-{} {}:{}",
        &digits[0..4],
        &digits[4..6],
        &digits[6..8],
        &digits[8..10],
        &digits[10..12]
    )
}
