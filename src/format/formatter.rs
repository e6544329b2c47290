use crate::domain::LogRecord;

/// Timestamp layout used in every record header.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Header prefix shared by the record line and every context line.
pub fn record_header(record: &LogRecord) -> String {
    format!(
        "[{}] [{}] [{}]",
        record.logger_name,
        record.level,
        record.timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Render a record as a human-readable multi-line block.
///
/// Layout, one element per line:
/// 1. `<header> <message>`
/// 2. `<error type>: <error message>` when the record carries an error
/// 3. the stack trace, verbatim
/// 4. each line of `extra_lines`, prefixed with the header
pub fn format_record(record: &LogRecord, extra_lines: Option<&str>) -> String {
    let header = record_header(record);
    let mut out = format!("{header} {}", record.message);

    if let Some(error) = &record.error {
        out.push('\n');
        out.push_str(&error.to_string());
    }

    if let Some(stack_trace) = &record.stack_trace {
        out.push('\n');
        out.push_str(stack_trace);
    }

    if let Some(extra) = extra_lines {
        for line in extra.lines() {
            out.push('\n');
            out.push_str(&header);
            out.push(' ');
            out.push_str(line);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorInfo, LogLevel};
    use chrono::{TimeZone, Utc};

    fn record() -> LogRecord {
        LogRecord::new("http", LogLevel::Warn, "slow request")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap())
    }

    #[test]
    fn test_header_layout() {
        assert_eq!(
            record_header(&record()),
            "[http] [WARN] [2024-03-09 14:05:07.000]"
        );
    }

    #[test]
    fn test_plain_record_is_single_line() {
        let text = format_record(&record(), None);
        assert_eq!(text, "[http] [WARN] [2024-03-09 14:05:07.000] slow request");
    }

    #[test]
    fn test_error_and_stack_follow_message() {
        let record = record()
            .with_error(ErrorInfo::new("TimeoutError", "deadline exceeded"))
            .with_stack_trace("frame 0\nframe 1");

        let text = format_record(&record, None);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("slow request"));
        assert_eq!(lines[1], "TimeoutError: deadline exceeded");
        assert_eq!(lines[2], "frame 0");
        assert_eq!(lines[3], "frame 1");
    }

    #[test]
    fn test_extra_lines_are_prefixed_with_header() {
        let text = format_record(&record(), Some("app_version: 1.0.0\nuser: id=1"));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "[http] [WARN] [2024-03-09 14:05:07.000] app_version: 1.0.0");
        assert_eq!(lines[2], "[http] [WARN] [2024-03-09 14:05:07.000] user: id=1");
    }

    #[test]
    fn test_formatting_is_deterministic() {
        let record = record().with_error(ErrorInfo::new("E", "x"));
        assert_eq!(
            format_record(&record, Some("a")),
            format_record(&record, Some("a"))
        );
    }
}
