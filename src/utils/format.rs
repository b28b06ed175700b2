use chrono::{DateTime, Local};

/// Format a Slack message timestamp ("1712345678.000200") as local time.
/// Unparseable input is returned unchanged.
pub fn format_ts(ts: &str) -> String {
    let Ok(secs) = ts.parse::<f64>() else {
        return ts.to_string();
    };
    format_epoch(secs as i64)
}

/// Format epoch seconds as local time.
pub fn format_epoch(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => secs.to_string(),
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ts_parses_slack_timestamps() {
        // Exact local rendering depends on the host timezone; check shape.
        let formatted = format_ts("1712345678.000200");
        assert_eq!(formatted.len(), "2024-04-05 20:14".len());
        assert!(formatted.starts_with("202"));
    }

    #[test]
    fn test_format_ts_passes_through_garbage() {
        assert_eq!(format_ts("not-a-ts"), "not-a-ts");
        assert_eq!(format_ts(""), "");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly-ten", 11), "exactly-ten");
        assert_eq!(truncate("a rather long string", 10), "a rathe...");
        assert_eq!(truncate("abc", 2), "ab");
    }
}
