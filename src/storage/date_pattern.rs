use super::StorageError;
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// Default file naming pattern: unpadded year-month-day.
pub const DEFAULT_DATE_PATTERN: &str = "y-M-d";

/// A calendar-date pattern in letter notation (`y`, `M`, `d`), compiled to a
/// chrono format string.
///
/// Supported fields:
/// - `y`, `yyy`, `yyyy`: full year; `yy`: two-digit year
/// - `M`: month, `MM`: zero-padded month, `MMM`: abbreviated name, `MMMM`: full name
/// - `d`: day, `dd`: zero-padded day
///
/// Any non-letter character is a literal. Parsing accepts padded and unpadded
/// numbers regardless of the field width, so `2023-01-05` and `2023-1-5` both
/// parse with the default pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePattern {
    pattern: String,
    chrono_format: String,
}

impl DatePattern {
    pub fn new(pattern: &str) -> Result<Self, StorageError> {
        let invalid = |reason: String| StorageError::InvalidDatePattern {
            pattern: pattern.to_string(),
            reason,
        };

        let mut chrono_format = String::with_capacity(pattern.len() * 2);
        let (mut has_year, mut has_month, mut has_day) = (false, false, false);
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if !c.is_ascii_alphabetic() {
                if c == '%' {
                    chrono_format.push_str("%%");
                } else {
                    chrono_format.push(c);
                }
                continue;
            }

            let mut run = 1;
            while chars.peek() == Some(&c) {
                chars.next();
                run += 1;
            }

            let directive = match (c, run) {
                ('y', 2) => "%y",
                ('y', 1 | 3 | 4) => "%Y",
                ('M', 1) => "%-m",
                ('M', 2) => "%m",
                ('M', 3) => "%b",
                ('M', 4) => "%B",
                ('d', 1) => "%-d",
                ('d', 2) => "%d",
                _ => {
                    return Err(invalid(format!(
                        "unsupported field '{}'",
                        c.to_string().repeat(run)
                    )));
                }
            };
            match c {
                'y' => has_year = true,
                'M' => has_month = true,
                _ => has_day = true,
            }
            chrono_format.push_str(directive);
        }

        if !(has_year && has_month && has_day) {
            return Err(invalid(
                "pattern must contain year, month and day fields".to_string(),
            ));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            chrono_format,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.chrono_format).to_string()
    }

    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text, &self.chrono_format).ok()
    }
}

impl Default for DatePattern {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_PATTERN.to_string(),
            chrono_format: "%Y-%-m-%-d".to_string(),
        }
    }
}

impl FromStr for DatePattern {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_pattern_matches_compiled_form() {
        assert_eq!(DatePattern::new("y-M-d").unwrap(), DatePattern::default());
    }

    #[test]
    fn test_default_pattern_formats_unpadded() {
        let pattern = DatePattern::default();
        assert_eq!(pattern.format(date(2024, 3, 9)), "2024-3-9");
        assert_eq!(pattern.format(date(2024, 11, 23)), "2024-11-23");
    }

    #[test]
    fn test_parse_accepts_padded_and_unpadded() {
        let pattern = DatePattern::default();
        assert_eq!(pattern.parse("2023-01-02"), Some(date(2023, 1, 2)));
        assert_eq!(pattern.parse("2023-1-2"), Some(date(2023, 1, 2)));
    }

    #[test]
    fn test_parse_rejects_other_names() {
        let pattern = DatePattern::default();
        assert_eq!(pattern.parse("notes"), None);
        assert_eq!(pattern.parse("2023-13-01"), None);
        assert_eq!(pattern.parse("2023-01-01-backup"), None);
    }

    #[test]
    fn test_padded_pattern_round_trips() {
        let pattern = DatePattern::new("yyyy.MM.dd").unwrap();
        let formatted = pattern.format(date(2023, 1, 2));
        assert_eq!(formatted, "2023.01.02");
        assert_eq!(pattern.parse(&formatted), Some(date(2023, 1, 2)));
    }

    #[test]
    fn test_month_names() {
        let pattern = DatePattern::new("d MMM y").unwrap();
        assert_eq!(pattern.format(date(2023, 2, 7)), "7 Feb 2023");
        assert_eq!(pattern.parse("7 Feb 2023"), Some(date(2023, 2, 7)));
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(DatePattern::new("y-M").is_err());
        assert!(DatePattern::new("y-M-d HH").is_err());
        assert!(DatePattern::new("yyyyy-M-d").is_err());
        assert!(DatePattern::new("").is_err());
    }
}
