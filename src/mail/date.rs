// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Normalization of the free-form dates found in trace headers
//!
//! Dates in `Received:` headers come in many shapes besides the RFC 5322
//! `date-time`: ISO dates, US-style numeric dates, twelve-hour clocks, named
//! zones, and fractional seconds. They are first rewritten into a canonical
//! form and then read by a lenient grammar which accepts date components in
//! any order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::{syntax::*, util::{self, SetOnce}};

static UTC_ZONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(UTC\)|\bUTC\b").unwrap());
static WHITE_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static YEAR_FIRST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());
static YEAR_LAST: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})-(\d{1,2})-(\d{4})").unwrap());
static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}:\d{2}:\d{2})\.(\d+)").unwrap());
static NUMERIC_ZONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|\s|(?i:GMT|UTC?))[+-]\d{2}:?\d{2}\b").unwrap());

/// A date in display form together with its timestamp
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct DateWithNum {
    /// Display form, empty when the date could not be read
    pub date: String,
    /// Milliseconds since the Unix epoch, `None` when the date could not be
    /// read
    pub date_num: Option<i64>,
}

/// Read a date from a trace header
///
/// Dates without an explicit numeric offset are taken to be in UTC. The
/// display form is rendered at `display_offset`.
pub fn parse_date(raw: &str, display_offset: UtcOffset) -> DateWithNum {
    let mut text = raw.trim().to_owned();

    if text.is_empty() {
        return DateWithNum::default();
    }

    if UTC_ZONE.is_match(&text) {
        let stripped = UTC_ZONE.replace_all(&text, " ");
        text = format!("{} (UTC)", WHITE_SPACE.replace_all(stripped.trim(), " "));
    }

    text = YEAR_FIRST.replace_all(&text, "${2}/${3}/${1}").into_owned();
    text = YEAR_LAST.replace_all(&text, "${1}/${2}/${3}").into_owned();

    let mut millis = 0;
    if let Some(captures) = FRACTION.captures(&text) {
        millis = fraction_millis(&captures[2]);
        text = FRACTION.replace(&text, "${1}").into_owned();
    }

    let candidates = if NUMERIC_ZONE.is_match(&text) {
        vec![text]
    } else {
        vec![format!("{text} +0000"), format!("{text} 00:00:00 +0000")]
    };

    let mut last_error = None;
    for candidate in &candidates {
        match date_time(&mut Buffer::new(candidate.as_bytes())) {
            Ok(date) => {
                let date_num = date.unix_timestamp() * 1000 + millis;
                return DateWithNum {
                    date: display_date(date_num, display_offset),
                    date_num: Some(date_num),
                };
            }
            Err(err) => last_error = Some(err),
        }
    }

    if let Some(err) = last_error {
        log::trace!("unreadable date {:?}: {err}", util::maybe_ascii(raw));
    }

    DateWithNum::default()
}

/// Format a timestamp as `M/D/YYYY h:mm:ss AM` at `offset`
///
/// Returns an empty string for timestamps outside the representable range.
pub fn display_date(date_num: i64, offset: UtcOffset) -> String {
    let seconds = date_num.div_euclid(1000) + i64::from(offset.whole_seconds());

    let date = match OffsetDateTime::from_unix_timestamp(seconds) {
        Ok(date) => date,
        Err(_) => return String::new(),
    };

    let (hour, meridiem) = match date.hour() {
        0 => (12, "AM"),
        hour @ 1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        hour => (hour - 12, "PM"),
    };

    format!("{}/{}/{} {}:{:02}:{:02} {}", u8::from(date.month()), date.day(),
        date.year(), hour, date.minute(), date.second(), meridiem)
}

/// Milliseconds from the digits following the decimal point
fn fraction_millis(digits: &str) -> i64 {
    digits.bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |value, digit| value * 10 + i64::from(digit - b'0'))
}

const MONTHS: [(&str, Month); 12] = [
    ("january", Month::January),
    ("february", Month::February),
    ("march", Month::March),
    ("april", Month::April),
    ("may", Month::May),
    ("june", Month::June),
    ("july", Month::July),
    ("august", Month::August),
    ("september", Month::September),
    ("october", Month::October),
    ("november", Month::November),
    ("december", Month::December),
];

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

/// Date components collected in whatever order they appear
#[derive(Default)]
struct Fields {
    year: Option<i32>,
    month: Option<Month>,
    day: Option<u8>,
    time: Option<(u8, u8, u8)>,
    /// `true` for PM
    meridiem: Option<bool>,
    offset: Option<UtcOffset>,
    /// End of the `GMT`/`UT` word which set `offset`
    universal_end: Option<usize>,
}

impl Fields {
    fn finish(self, buf: &Buffer) -> Result<OffsetDateTime> {
        let (year, month, day, (mut hour, minute, second)) =
            match (self.year, self.month, self.day, self.time) {
                (Some(year), Some(month), Some(day), Some(time)) => (year, month, day, time),
                (None, ..) => return buf.error("missing year"),
                (_, None, ..) => return buf.error("missing month"),
                (_, _, None, _) => return buf.error("missing day"),
                (.., None) => return buf.error("missing time"),
            };

        match self.meridiem {
            Some(_) if hour == 0 || hour > 12 => return buf.error("hour out of range for AM/PM"),
            Some(false) if hour == 12 => hour = 0,
            Some(true) if hour < 12 => hour += 12,
            _ => {}
        }

        let date = Date::from_calendar_date(year, month, day)
            .map_err(|err| SyntaxErrorKind::custom(err.to_string()).at(buf.offset()))?;
        let time = Time::from_hms(hour, minute, second)
            .map_err(|err| SyntaxErrorKind::custom(err.to_string()).at(buf.offset()))?;

        Ok(PrimitiveDateTime::new(date, time).assume_offset(self.offset.unwrap_or(UtcOffset::UTC)))
    }
}

/// Lenient date-time
///
/// Accepts day, month, year, time of day, AM/PM and zone in any order,
/// separated by white space or commas, with day names and comments ignored.
/// The first zone given is used, except that a numeric offset written right
/// after `GMT` or `UT` (`GMT+0100`) replaces it. Dates without a zone are in
/// UTC.
fn date_time(buf: &mut Buffer) -> Result<OffsetDateTime> {
    let mut fields = Fields::default();

    loop {
        buf.take_while(|c, _| c.is_ascii_whitespace() || c == b',');

        let c = match buf.first() {
            Some(&c) => c,
            None => break,
        };

        let offset = buf.offset();

        match c {
            b'(' => comment(buf),
            b'+' | b'-' => {
                let zone = zone(buf)?;
                if fields.offset.is_none() || fields.universal_end == Some(offset) {
                    fields.offset = Some(zone);
                    fields.universal_end = None;
                }
            }
            b'0'..=b'9' => number(buf, &mut fields)?,
            c if c.is_ascii_alphabetic() => {
                let word = buf.take_ascii_while(|c| c.is_ascii_alphabetic());
                let end = buf.offset();
                if buf.first() == Some(&b'.') {
                    buf.advance(1);
                }
                self::word(word, offset, end, &mut fields)?;
            }
            _ => return buf.error(format!("unexpected character {:?}", util::maybe_ascii(&[c]))),
        }
    }

    fields.finish(buf)
}

/// Skip a comment, including nested comments
///
/// An unterminated comment extends to the end of input.
fn comment(buf: &mut Buffer) {
    let mut depth = 0;

    buf.take_while(|c, _| {
        if depth == 0 && c != b'(' {
            return false;
        }

        match c {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }

        true
    });
}

/// Numeric zone, `+HHMM` or `+HH:MM`
fn zone(buf: &mut Buffer) -> Result<UtcOffset> {
    buf.atomic(|buf| {
        let offset = buf.offset();
        let positive = buf[0] == b'+';
        buf.advance(1);

        let hours: i32 = read_number(buf, 10, 2, 2)?;
        buf.maybe(|buf| buf.expect(b":"));
        let minutes: i32 = read_number(buf, 10, 2, 2)?;

        let seconds = (hours * 60 + minutes) * 60;
        let seconds = if positive { seconds } else { -seconds };
        UtcOffset::from_whole_seconds(seconds)
            .map_err(|err| SyntaxErrorKind::custom(err.to_string()).at(offset))
    })
}

/// Time of day, `M/D/Y` date, or a lone day or year
fn number(buf: &mut Buffer, fields: &mut Fields) -> Result<()> {
    let offset = buf.offset();
    let digits = buf.take_ascii_while(|c| c.is_ascii_digit());

    match buf.first().copied() {
        Some(b':') => {
            let hour = small_number(digits, offset)?;
            buf.advance(1);
            let minute = read_number(buf, 10, 2, 2)?;
            let second = buf.maybe(|buf| {
                buf.expect(b":")?;
                read_number(buf, 10, 2, 2)
            }).unwrap_or(0);
            fields.time.set_once(offset, "time", (hour, minute, second))
        }
        Some(b'/') => {
            let month = small_number(digits, offset)?;
            let month = Month::try_from(month)
                .map_err(|err| SyntaxErrorKind::custom(err.to_string()).at(offset))?;
            buf.expect(b"/")?;
            let day = read_number(buf, 10, 1, 2)?;
            buf.expect(b"/")?;
            let year_offset = buf.offset();
            let year = buf.take_ascii_while(|c| c.is_ascii_digit());
            fields.month.set_once(offset, "month", month)?;
            fields.day.set_once(offset, "day", day)?;
            fields.year.set_once(year_offset, "year", year_number(year, year_offset)?)
        }
        _ if digits.len() >= 3 || fields.day.is_some() => {
            fields.year.set_once(offset, "year", year_number(digits, offset)?)
        }
        _ => match small_number(digits, offset)? {
            day @ 1..=31 => fields.day.set_once(offset, "day", day),
            _ => fields.year.set_once(offset, "year", year_number(digits, offset)?),
        },
    }
}

fn small_number(digits: &str, offset: usize) -> Result<u8> {
    if digits.len() > 2 {
        return Err(SyntaxErrorKind::custom("expected at most 2 digits").at(offset));
    }

    digits.parse().map_err(|_| SyntaxErrorKind::custom("expected a number").at(offset))
}

/// Year, with two-digit years placed in 1950–2049
fn year_number(digits: &str, offset: usize) -> Result<i32> {
    let year: i32 = match digits.len() {
        1..=4 => digits.parse()
            .map_err(|_| SyntaxErrorKind::custom("expected a number").at(offset))?,
        _ => return Err(SyntaxErrorKind::custom("expected 2 or 4 digit year").at(offset)),
    };

    Ok(match digits.len() {
        1 | 2 if year < 50 => 2000 + year,
        1 | 2 => 1900 + year,
        _ => year,
    })
}

/// Month or day name, AM/PM, or a named zone
fn word(word: &str, offset: usize, end: usize, fields: &mut Fields) -> Result<()> {
    let lower = word.to_ascii_lowercase();

    if lower.len() >= 3 {
        if let Some(&(_, month)) = MONTHS.iter().find(|(name, _)| name.starts_with(&lower)) {
            return fields.month.set_once(offset, "month", month);
        }

        if WEEKDAYS.iter().any(|name| name.starts_with(&lower)) {
            return Ok(());
        }
    }

    let hours = match_ignore_ascii_case! { word;
        "AM" => return fields.meridiem.set_once(offset, "AM/PM", false),
        "PM" => return fields.meridiem.set_once(offset, "AM/PM", true),
        "T" => return Ok(()),
        "UT" | "UTC" | "GMT" => {
            if fields.offset.is_none() {
                fields.offset = Some(UtcOffset::UTC);
                fields.universal_end = Some(end);
            }
            return Ok(());
        },
        "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => return Err(SyntaxErrorKind::custom(
            format!("unknown word {:?}", util::maybe_ascii(word))).at(offset)),
    };

    if fields.offset.is_none() {
        fields.offset = UtcOffset::from_hms(hours, 0, 0).ok();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::offset;

    fn date_num(raw: &str) -> Option<i64> {
        parse_date(raw, UtcOffset::UTC).date_num
    }

    #[test]
    fn rfc5322_dates() {
        assert_eq!(
            parse_date("Thu, 21 Aug 2014 12:12:48 +0200 (CEST)", UtcOffset::UTC),
            DateWithNum {
                date: "8/21/2014 10:12:48 AM".into(),
                date_num: Some(1408615968000),
            },
        );
        assert_eq!(date_num("24 Aug 2014 16:13:38 -0000"), Some(1408896818000));
        assert_eq!(date_num("Wed, 10 Dec 2014 17:15:18 -0800 (PST)"), Some(1418260518000));
        assert_eq!(date_num("  Sat, 21 Feb 2015 09:30:30 GMT  "), Some(1424511030000));
    }

    #[test]
    fn iso_date_with_fraction() {
        assert_eq!(date_num("2014-08-21 12:12:48.123456 UTC"), Some(1408623168123));
        assert_eq!(date_num("2014-08-21 12:12:48 (UTC)"), Some(1408623168000));
        assert_eq!(date_num("2014-8-21 12:12:48.5"), Some(1408623168500));
        assert_eq!(date_num("2014-08-21T12:12:48Z"), Some(1408623168000));
        assert_eq!(date_num("2014-08-21 12:12:48 +02:00"), Some(1408615968000));
    }

    #[test]
    fn us_date_with_meridiem() {
        assert_eq!(date_num("8-21-2014 10:00:00 PM"), Some(1408658400000));
        assert_eq!(date_num("8/21/2014 12:12:48 PM"), Some(1408623168000));
        assert_eq!(date_num("8/22/2014 12:00:00 AM"), Some(1408665600000));
    }

    #[test]
    fn missing_time_is_midnight() {
        assert_eq!(date_num("Mon, 1 Jan 2018"), Some(1514764800000));
    }

    #[test]
    fn missing_zone_is_utc() {
        assert_eq!(date_num("Thu, 21 Aug 2014 12:12:48"), Some(1408623168000));
        assert_eq!(date_num("Aug 21, 2014 12:12:48 EST"), Some(1408641168000));
    }

    #[test]
    fn offset_after_gmt() {
        assert_eq!(date_num("8 Jan 2018 10:00:00 GMT+0100"), Some(1515402000000));
        assert_eq!(date_num("8 Jan 2018 10:00:00 gmt-05:00"), Some(1515423600000));
        assert_eq!(date_num("8 Jan 2018 10:00:00 UT+0100"), Some(1515402000000));
        assert_eq!(date_num("8 Jan 2018 10:00:00 UTC+0100"), Some(1515402000000));
        assert_eq!(date_num("8 Jan 2018 10:00:00 GMT"), Some(1515405600000));
        assert_eq!(date_num("8 Jan 2018 10:00:00 EST+0100"), Some(1515423600000));
    }

    #[test]
    fn unreadable_dates() {
        assert_eq!(parse_date("", UtcOffset::UTC), DateWithNum::default());
        assert_eq!(parse_date("garbage", UtcOffset::UTC), DateWithNum::default());
        assert_eq!(date_num("31 Feb 2014 10:00:00 +0000"), None);
        assert_eq!(date_num("21 Aug 2014 25:00:00 +0000"), None);
        assert_eq!(date_num("21 22 Aug 2014 10:00:00 +0000"), None);
    }

    #[test]
    fn display_offset() {
        assert_eq!(
            parse_date("Thu, 21 Aug 2014 12:12:48 +0200", offset!(+2)).date,
            "8/21/2014 12:12:48 PM",
        );
        assert_eq!(display_date(0, UtcOffset::UTC), "1/1/1970 12:00:00 AM");
        assert_eq!(display_date(-1, UtcOffset::UTC), "12/31/1969 11:59:59 PM");
    }
}
