const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable byte count. One decimal below 10 in any unit above bytes.
pub fn format_bytes(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes else {
        return "Unknown".to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if value >= 10.0 || unit == 0 {
        format!("{} {}", value.round(), UNITS[unit])
    } else {
        format!("{:.1} {}", (value * 10.0).round() / 10.0, UNITS[unit])
    }
}

/// Leading decimal digits of a header value, ignoring surrounding whitespace.
pub fn parse_content_length(value: &str) -> Option<u64> {
    let trimmed = value.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Total size from a `Content-Range` header such as `bytes 0-0/12345`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim_end().rsplit_once('/')?;
    if total.is_empty() || !total.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    total.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_units() {
        assert_eq!(format_bytes(Some(0)), "0 B");
        assert_eq!(format_bytes(Some(1023)), "1023 B");
        assert_eq!(format_bytes(Some(1024)), "1.0 KB");
        assert_eq!(format_bytes(Some(1536)), "1.5 KB");
        assert_eq!(format_bytes(Some(10 * 1024)), "10 KB");
        assert_eq!(format_bytes(Some(5 * 1024 * 1024 + 300 * 1024)), "5.3 MB");
        assert_eq!(format_bytes(Some(3 * 1024_u64.pow(5))), "3072 TB");
        assert_eq!(format_bytes(None), "Unknown");
    }

    #[test]
    fn content_headers() {
        assert_eq!(parse_content_length(" 2048"), Some(2048));
        assert_eq!(parse_content_length("12abc"), Some(12));
        assert_eq!(parse_content_length("abc"), None);
        assert_eq!(parse_content_range_total("bytes 0-0/12345  "), Some(12345));
        assert_eq!(parse_content_range_total("bytes 0-0/*"), None);
        assert_eq!(parse_content_range_total("12345"), None);
    }
}
