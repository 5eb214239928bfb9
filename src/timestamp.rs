use chrono::{NaiveDate, NaiveDateTime};

/// Fixed-width `YYYYMMDDHHMM` prefix every guide timestamp must carry.
pub const MIN_WIDTH: usize = 12;

const START_FMT: &str = "%H:%M %Y/%m/%d";
// Stop times keep a trailing space so pages match ones produced earlier.
const STOP_FMT: &str = "%H:%M %Y/%m/%d ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("expected at least 12 characters, got {0}")]
    TooShort(usize),
    #[error("first 12 characters must be digits")]
    NotNumeric,
    #[error("not a valid calendar date/time")]
    OutOfRange,
}

/// A guide timestamp such as `20240115103000 +0100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpgTime {
    pub at: NaiveDateTime,
    /// Offset text exactly as it appears after the digits, e.g. `+0100`.
    pub offset: String,
}

impl EpgTime {
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let len = raw.chars().count();
        if len < MIN_WIDTH { return Err(TimestampError::TooShort(len)); }
        let digits = raw.bytes().take_while(u8::is_ascii_digit).count();
        if digits < MIN_WIDTH { return Err(TimestampError::NotNumeric); }
        // The prefix is ASCII digits, so byte slicing is safe.
        let field = |a: usize, b: usize| raw[a..b].parse::<u32>().map_err(|_| TimestampError::NotNumeric);
        let date = NaiveDate::from_ymd_opt(field(0, 4)? as i32, field(4, 6)?, field(6, 8)?).ok_or(TimestampError::OutOfRange)?;
        let at = date.and_hms_opt(field(8, 10)?, field(10, 12)?, 0).ok_or(TimestampError::OutOfRange)?;
        Ok(Self { at, offset: raw[digits..].trim().to_string() })
    }

    pub fn format_start(&self) -> String { self.at.format(START_FMT).to_string() }

    pub fn format_stop(&self) -> String { self.at.format(STOP_FMT).to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_start_and_stop() {
        let t = EpgTime::parse("20240115103000+0100").unwrap();
        assert_eq!(t.format_start(), "10:30 2024/01/15");
        assert_eq!(t.format_stop(), "10:30 2024/01/15 ");
        assert_eq!(t.offset, "+0100");
    }

    #[test]
    fn offset_after_space_matches_fixed_column() {
        let raw = "20240115103000 +0100";
        let t = EpgTime::parse(raw).unwrap();
        assert_eq!(t.offset, &raw[15..]);
    }

    #[test]
    fn minute_precision_without_seconds() {
        let t = EpgTime::parse("202401151000+0000").unwrap();
        assert_eq!(t.format_start(), "10:00 2024/01/15");
        assert_eq!(t.offset, "+0000");
    }

    #[test]
    fn no_offset_is_empty() {
        let t = EpgTime::parse("202412312359").unwrap();
        assert_eq!(t.format_start(), "23:59 2024/12/31");
        assert_eq!(t.offset, "");
    }

    #[test]
    fn rejects_short_input() {
        assert_eq!(EpgTime::parse("2024011510"), Err(TimestampError::TooShort(10)));
        assert_eq!(EpgTime::parse(""), Err(TimestampError::TooShort(0)));
    }

    #[test]
    fn rejects_non_digits() {
        assert_eq!(EpgTime::parse("2024-01-15 10:30"), Err(TimestampError::NotNumeric));
        assert_eq!(EpgTime::parse("20240115é0300000"), Err(TimestampError::NotNumeric));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(EpgTime::parse("202402301000"), Err(TimestampError::OutOfRange));
        assert_eq!(EpgTime::parse("202401152500"), Err(TimestampError::OutOfRange));
        assert_eq!(EpgTime::parse("202413011000"), Err(TimestampError::OutOfRange));
    }
}
