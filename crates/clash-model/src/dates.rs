//! Date decoding for clash exports.
//!
//! View names encode the found date in one of three conventions:
//! `YYYYMMDD`, `YYMMDD` (two-digit year, always 20xx), or an already
//! hyphenated `YYYY-MM-DD`. Tracking sheets additionally use slashed
//! regional formats. Anything unrecognized decodes to `None`; a date is
//! never fabricated from a malformed value.

use chrono::NaiveDate;

/// Decode a date token taken from a view name.
///
/// Accepts `YYYYMMDD`, `YYMMDD` (prefixed with `20`), and `YYYY-MM-DD`.
pub fn parse_clash_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.len() == 10 && value.as_bytes()[4] == b'-' && value.as_bytes()[7] == b'-' {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let compact = match value.len() {
        8 if value.bytes().all(|b| b.is_ascii_digit()) => value.to_string(),
        6 if value.bytes().all(|b| b.is_ascii_digit()) => format!("20{value}"),
        _ => return None,
    };
    NaiveDate::parse_from_str(&compact, "%Y%m%d").ok()
}

/// Decode a date cell taken from a prior tracking export.
///
/// Tracking sheets come back in whatever format the spreadsheet tool
/// last saved, so slashed US/European forms are accepted alongside the
/// view-name encodings.
pub fn parse_tracking_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let formats = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];
    for fmt in &formats {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    parse_clash_date(value)
}

/// Format a date for exports (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn accepts_all_three_view_name_encodings() {
        let expected = Some(date(2023, 7, 15));
        assert_eq!(parse_clash_date("20230715"), expected);
        assert_eq!(parse_clash_date("230715"), expected);
        assert_eq!(parse_clash_date("2023-07-15"), expected);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(parse_clash_date(""), None);
        assert_eq!(parse_clash_date("L01"), None);
        assert_eq!(parse_clash_date("2023071"), None);
        assert_eq!(parse_clash_date("20231345"), None); // month 13
        assert_eq!(parse_clash_date("2023/07/15"), None);
    }

    #[test]
    fn tracking_dates_accept_slashed_forms() {
        assert_eq!(parse_tracking_date("07/15/2023"), Some(date(2023, 7, 15)));
        assert_eq!(parse_tracking_date("25/12/2023"), Some(date(2023, 12, 25)));
        assert_eq!(parse_tracking_date("2023-07-15"), Some(date(2023, 7, 15)));
        assert_eq!(parse_tracking_date("230715"), Some(date(2023, 7, 15)));
        assert_eq!(parse_tracking_date("sometime soon"), None);
    }

    #[test]
    fn ambiguous_slashed_dates_prefer_us_order() {
        // 01/02/2023 parses as January 2nd; the US form is tried first,
        // matching the original tracking-sheet reader.
        assert_eq!(parse_tracking_date("01/02/2023"), Some(date(2023, 1, 2)));
    }

    #[test]
    fn formats_iso() {
        assert_eq!(format_date(date(2023, 7, 15)), "2023-07-15");
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            // Every supported encoding of the same calendar date decodes
            // to the same date.
            #[test]
            fn encodings_agree(y in 2000i32..2100, m in 1u32..=12, d in 1u32..=28) {
                let expected = date(y, m, d);
                let compact = expected.format("%Y%m%d").to_string();
                let short = expected.format("%y%m%d").to_string();
                let hyphenated = expected.format("%Y-%m-%d").to_string();

                prop_assert_eq!(parse_clash_date(&compact), Some(expected));
                prop_assert_eq!(parse_clash_date(&short), Some(expected));
                prop_assert_eq!(parse_clash_date(&hyphenated), Some(expected));
            }

            // Decoded dates round-trip through the export format.
            #[test]
            fn round_trips_through_format(y in 2000i32..2100, m in 1u32..=12, d in 1u32..=28) {
                let expected = date(y, m, d);
                let formatted = format_date(expected);
                prop_assert_eq!(parse_clash_date(&formatted), Some(expected));
            }
        }
    }
}
