// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Extraction of fields from `Received:` trace headers
//!
//! RFC 5322 section 3.6.7 gives `Received:` a loose grammar of name-value
//! pairs followed by `; date-time`, and relays interpret it more loosely
//! still. Fields are located by keyword, and the date by a list of
//! heuristics tried in order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use time::UtcOffset;

use crate::util;
use super::{date::{self, DateWithNum}, timeline::DelaySort};

/// One relay step
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReceivedRow {
    /// Text of the header this row was read from
    pub source_header: Option<String>,
    /// Position in relay order, starting at 1
    pub hop: usize,
    pub from: Option<String>,
    pub by: Option<String>,
    pub with: Option<String>,
    pub id: Option<String>,
    #[serde(rename = "for")]
    pub for_: Option<String>,
    pub via: Option<String>,
    pub date: String,
    pub date_num: Option<i64>,
    pub delay: String,
    pub delay_sort: DelaySort,
    pub percent: f64,
}

impl Default for ReceivedRow {
    fn default() -> Self {
        ReceivedRow {
            source_header: None,
            hop: 0,
            from: None,
            by: None,
            with: None,
            id: None,
            for_: None,
            via: None,
            date: String::new(),
            date_num: None,
            delay: String::new(),
            delay_sort: DelaySort::Unknown,
            percent: 0.0,
        }
    }
}

/// Named part of a `Received:` header
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceivedField {
    From,
    By,
    With,
    Id,
    For,
    Via,
}

impl ReceivedField {
    pub fn from_keyword(keyword: &str) -> Option<ReceivedField> {
        match_ignore_ascii_case! { keyword;
            "from" => Some(ReceivedField::From),
            "by" => Some(ReceivedField::By),
            "with" => Some(ReceivedField::With),
            "id" => Some(ReceivedField::Id),
            "for" => Some(ReceivedField::For),
            "via" => Some(ReceivedField::Via),
            _ => None,
        }
    }
}

impl ReceivedRow {
    pub fn field(&self, field: ReceivedField) -> Option<&str> {
        match field {
            ReceivedField::From => self.from.as_deref(),
            ReceivedField::By => self.by.as_deref(),
            ReceivedField::With => self.with.as_deref(),
            ReceivedField::Id => self.id.as_deref(),
            ReceivedField::For => self.for_.as_deref(),
            ReceivedField::Via => self.via.as_deref(),
        }
    }

    fn field_mut(&mut self, field: ReceivedField) -> &mut Option<String> {
        match field {
            ReceivedField::From => &mut self.from,
            ReceivedField::By => &mut self.by,
            ReceivedField::With => &mut self.with,
            ReceivedField::Id => &mut self.id,
            ReceivedField::For => &mut self.for_,
            ReceivedField::Via => &mut self.via,
        }
    }

    /// Set a field, appending to any earlier value
    ///
    /// Empty values leave the field untouched.
    pub fn set_field(&mut self, field: ReceivedField, value: &str) {
        let value = value.trim();

        if value.is_empty() {
            return;
        }

        let slot = self.field_mut(field);
        *slot = match slot.take() {
            Some(existing) => Some(format!("{existing}; {value}")),
            None => Some(value.to_owned()),
        };
    }
}

/// Position of the date within a header value
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct DateSplit {
    /// End of the text holding named fields
    fields_end: usize,
    /// Start of the date
    date_start: usize,
}

/// A day name followed by a day number or a month name
static LAST_WEEKDAY: Lazy<Regex> = Lazy::new(|| Regex::new(
    r"\s*\b(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\b,?\s+(\d|(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\b)",
).unwrap());
static LAST_ISO_DATE: Lazy<Regex> = Lazy::new(||
    Regex::new(r"\s*\b\d{4}-\d{1,2}-\d{1,2}").unwrap());

/// Ways of finding the date, in order of preference
const DATE_FINDERS: [fn(&str) -> Option<DateSplit>; 3] = [
    after_last_semicolon,
    before_last_weekday,
    before_last_iso_date,
];

fn after_last_semicolon(text: &str) -> Option<DateSplit> {
    let inx = text.rfind(';')?;
    Some(DateSplit { fields_end: inx, date_start: inx + 1 })
}

fn before_last_weekday(text: &str) -> Option<DateSplit> {
    let found = LAST_WEEKDAY.find_iter(text).last()?;
    Some(DateSplit { fields_end: found.start(), date_start: found.start() })
}

fn before_last_iso_date(text: &str) -> Option<DateSplit> {
    let found = LAST_ISO_DATE.find_iter(text).last()?;
    Some(DateSplit { fields_end: found.start(), date_start: found.start() })
}

/// Malformed shapes emitted by some relays
///
/// Each pattern captures the text before the clause, the clause itself,
/// which becomes `by`, and the text after it.
static REPAIRS: Lazy<[(&str, Regex); 2]> = Lazy::new(|| [
    ("Postfix", Regex::new(r"(?i)(.*)by (.*? \(Postfix, from userid .*?\))(.*)").unwrap()),
    ("qmail", Regex::new(r"(?i)(.*)\((qmail .*? invoked from .*?)\)(.*)").unwrap()),
]);

/// Read the fields and date of one `Received:` header value
pub fn parse_received(value: &str, display_offset: UtcOffset) -> ReceivedRow {
    let mut row = ReceivedRow {
        source_header: Some(value.to_owned()),
        ..ReceivedRow::default()
    };

    let text = value.replace(|c: char| c == '\r' || c == '\n', " ");

    let (fields, DateWithNum { date, date_num }) =
        match DATE_FINDERS.iter().find_map(|finder| finder(&text)) {
            Some(split) => (
                &text[..split.fields_end],
                date::parse_date(&text[split.date_start..], display_offset),
            ),
            None => (text.as_str(), DateWithNum::default()),
        };

    row.date = date;
    row.date_num = date_num;

    let mut remainder = fields.to_owned();

    for (vendor, pattern) in REPAIRS.iter() {
        if let Some(captures) = pattern.captures(fields) {
            log::trace!("repairing {vendor} Received header {:?}", util::maybe_ascii(value));
            row.set_field(ReceivedField::By, &captures[2]);
            remainder = format!("{}{}", &captures[1], &captures[3]);
            break;
        }
    }

    let tokens: Vec<&str> = remainder.split_whitespace().collect();

    let mut occurrences: Vec<(usize, ReceivedField)> = tokens.iter()
        .enumerate()
        .filter_map(|(inx, token)| Some((inx, ReceivedField::from_keyword(token)?)))
        .collect();
    occurrences.sort_by_key(|&(inx, _)| inx);

    for (nth, &(inx, field)) in occurrences.iter().enumerate() {
        let end = occurrences.get(nth + 1).map_or(tokens.len(), |&(next, _)| next);
        row.set_field(field, &tokens[inx + 1..end].join(" "));
    }

    row
}
