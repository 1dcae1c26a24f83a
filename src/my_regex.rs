use std::sync::OnceLock;

use regex::Regex;

/// A `M:SS` timestamp, the minutes and seconds being any run of digits.
/// `$name` prefixes the names of the captured groups.
macro_rules! tstamp {
    ($name:literal) => {
        concat!(
            r#"(?P<"#,
            $name,
            r#"_min>[0-9]+):(?P<"#,
            $name,
            r#"_sec>[0-9]+)"#
        )
    };
}
/// The separator between both timestamps
macro_rules! range_sep {
    () => {
        r#"\s*-\s*"#
    };
}

/// A clip range at the start of a line, anything after it is ignored.
/// Example: "2:30 - 3:15 the good part"
const RANGE_PATTERN: &str = concat!("^", tstamp!("start"), range_sep!(), tstamp!("end"));

static RANGE_RE: OnceLock<Regex> = OnceLock::new();

pub fn get_range_re() -> &'static Regex {
    RANGE_RE.get_or_init(|| Regex::new(RANGE_PATTERN).expect("range pattern is a valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_both_timestamps() {
        let cap = get_range_re().captures("12:05 -  13:40 intro").unwrap();
        assert_eq!(&cap["start_min"], "12");
        assert_eq!(&cap["start_sec"], "05");
        assert_eq!(&cap["end_min"], "13");
        assert_eq!(&cap["end_sec"], "40");
    }

    #[test]
    fn requires_range_at_line_start() {
        assert!(get_range_re().captures("from 1:00-2:00").is_none());
        assert!(get_range_re().captures("1:00").is_none());
        assert!(get_range_re().captures("1:00 2:00").is_none());
    }
}
