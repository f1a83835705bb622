//! Rename pattern expansion.

use chrono::{DateTime, Local};

/// Expand a rename pattern into a concrete file name.
///
/// Supported tokens: `{name}` (stem), `{ext}` (extension without the
/// separator), `{date}` (`YYYY-MM-DD`) and `{time}` (`HH-MM-SS`), both in
/// local time and filename-safe.
pub fn expand_pattern(pattern: &str, stem: &str, extension: &str, now: DateTime<Local>) -> String {
    pattern
        .replace("{name}", stem)
        .replace("{ext}", extension)
        .replace("{date}", &now.format("%Y-%m-%d").to_string())
        .replace("{time}", &now.format("%H-%M-%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap()
    }

    #[test]
    fn test_name_and_ext_tokens() {
        assert_eq!(
            expand_pattern("{name}_backup.{ext}", "report", "pdf", fixed_now()),
            "report_backup.pdf"
        );
    }

    #[test]
    fn test_date_and_time_tokens() {
        assert_eq!(
            expand_pattern("{date}_{time}_{name}.{ext}", "shot", "png", fixed_now()),
            "2024-03-09_14-30-05_shot.png"
        );
    }

    #[test]
    fn test_literal_pattern_untouched() {
        assert_eq!(
            expand_pattern("plain-name.txt", "x", "y", fixed_now()),
            "plain-name.txt"
        );
    }

    #[test]
    fn test_repeated_tokens() {
        assert_eq!(
            expand_pattern("{name}-{name}", "dup", "", fixed_now()),
            "dup-dup"
        );
    }
}
