// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Relay timeline: hop order and delays between hops

use serde::{Serialize, Serializer};

use super::{Strings, received::ReceivedRow};

/// Sort key of a hop's delay
///
/// Hops whose delay can't be computed sort before all others, and serialize
/// as `-1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum DelaySort {
    /// No timestamp for this hop or for any hop before it
    Unknown,
    /// Signed delay in milliseconds
    Millis(i64),
}

impl DelaySort {
    pub fn as_millis(self) -> i64 {
        match self {
            DelaySort::Unknown => -1,
            DelaySort::Millis(millis) => millis,
        }
    }
}

impl Default for DelaySort {
    fn default() -> Self {
        DelaySort::Unknown
    }
}

impl Serialize for DelaySort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_millis())
    }
}

/// `Received:` rows in relay order
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReceivedTimeline {
    pub rows: Vec<ReceivedRow>,
    /// Time between the first and last known timestamps, empty if they are
    /// the same
    pub total_time: String,
}

/// Order rows from the oldest hop and compute delays between hops
///
/// `rows` are expected in message order, which lists the most recent hop
/// first.
pub fn compute_deltas(mut rows: Vec<ReceivedRow>, strings: &Strings) -> ReceivedTimeline {
    rows.reverse();

    let mut positive_delta: i64 = 0;
    let mut start_time = None;
    let mut end_time = None;
    let mut last_time: Option<i64> = None;

    for current in rows.iter().filter_map(|row| row.date_num) {
        if let Some(previous) = last_time {
            if current > previous {
                positive_delta = positive_delta.saturating_add(current - previous);
            }
        }

        start_time.get_or_insert(current);
        end_time = Some(current);
        last_time = Some(current);
    }

    let mut last_time: Option<i64> = None;

    for (inx, row) in rows.iter_mut().enumerate() {
        row.hop = inx + 1;
        row.delay = format_duration(row.date_num, last_time, strings);

        if let (Some(current), Some(previous)) = (row.date_num, last_time) {
            if positive_delta != 0 {
                let delay = current.saturating_sub(previous);
                row.delay_sort = DelaySort::Millis(delay);

                if delay > 0 {
                    row.percent = 100.0 * delay as f64 / positive_delta as f64;
                }
            }
        }

        if row.date_num.is_some() {
            last_time = row.date_num;
        }
    }

    let total_time = if start_time == end_time {
        String::new()
    } else {
        format_duration(end_time, start_time, strings)
    };

    ReceivedTimeline { rows, total_time }
}

/// Format the time from `previous` to `current` as minutes and seconds
///
/// Either timestamp being unknown gives an empty string.
pub fn format_duration(current: Option<i64>, previous: Option<i64>, strings: &Strings) -> String {
    let (current, previous) = match (current, previous) {
        (Some(current), Some(previous)) => (current, previous),
        _ => return String::new(),
    };

    let diff = current.saturating_sub(previous);

    if diff.unsigned_abs() < 1000 {
        return format!("0 {}", strings.seconds);
    }

    let total_seconds = diff.unsigned_abs() / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;

    let mut parts = vec![];

    if minutes > 0 {
        let label = if minutes == 1 { &strings.minute } else { &strings.minutes };
        parts.push(format!("{minutes} {label}"));
    }

    if minutes == 0 || seconds != 0 {
        let label = if seconds == 1 { &strings.second } else { &strings.seconds };
        parts.push(format!("{seconds} {label}"));
    }

    let sign = if diff < 0 { strings.negative.as_str() } else { "" };
    format!("{sign}{}", parts.join(" "))
}
