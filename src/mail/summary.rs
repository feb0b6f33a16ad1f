// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Summary of the most interesting headers

use serde::Serialize;
use time::UtcOffset;

use super::{Strings, date, header::HeaderField};

/// Headers shown in the summary, with their labels
const SUMMARY_HEADERS: [(&str, &str); 8] = [
    ("Subject", "Subject"),
    ("Message-ID", "Message Id"),
    ("Archived-At", "Archived at"),
    ("Date", "Creation time"),
    ("From", "From"),
    ("Reply-To", "Reply to"),
    ("To", "To"),
    ("CC", "Cc"),
];

const CREATION_TIME: &str = "Date";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub header: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
}

impl Default for Summary {
    fn default() -> Self {
        Summary {
            rows: SUMMARY_HEADERS.iter()
                .map(|&(header, label)| SummaryRow { header, label, value: String::new() })
                .collect(),
        }
    }
}

impl Summary {
    /// Take the value of `field` if it is a summary header
    ///
    /// Returns `false` for other headers. A header which appears more than
    /// once keeps its last value.
    pub fn add(&mut self, field: &HeaderField, display_offset: UtcOffset) -> bool {
        let row = match self.rows.iter_mut().find(|row| row.header.eq_ignore_ascii_case(&field.name)) {
            Some(row) => row,
            None => return false,
        };

        row.value = if row.header == CREATION_TIME {
            let date = date::parse_date(&field.value, display_offset);
            if date.date.is_empty() { field.value.clone() } else { date.date }
        } else {
            field.value.clone()
        };

        true
    }

    /// Value of the row for `header`, ignoring case
    pub fn get(&self, header: &str) -> Option<&str> {
        self.rows.iter()
            .find(|row| row.header.eq_ignore_ascii_case(header))
            .map(|row| row.value.as_str())
    }

    /// When the message was written, followed by how long its delivery took
    /// once [`Summary::set_delivery_time`] has been called
    pub fn creation_time(&self) -> &str {
        self.get(CREATION_TIME).unwrap_or_default()
    }

    /// Append the time the message spent in transit to the creation time
    pub fn set_delivery_time(&mut self, total_time: &str, strings: &Strings) {
        if total_time.is_empty() {
            return;
        }

        if let Some(row) = self.rows.iter_mut().find(|row| row.header == CREATION_TIME) {
            if !row.value.is_empty() {
                row.value = format!("{} {} {}{}", row.value, strings.delivered_start,
                    total_time, strings.delivered_end);
            }
        }
    }
}
