// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Analysis of [RFC 5322](https://datatracker.ietf.org/doc/html/rfc5322)
//! message headers

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::report::{self, AntispamReport, ForefrontAntispamReport, Report};

pub use self::{
    date::{parse_date, DateWithNum},
    header::{header_list, HeaderField},
    received::{parse_received, ReceivedField, ReceivedRow},
    summary::{Summary, SummaryRow},
    timeline::{compute_deltas, format_duration, DelaySort, ReceivedTimeline},
};

pub mod date;
pub mod header;
pub mod received;
pub mod summary;
pub mod timeline;

/// Words used in durations and the delivery time
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Strings {
    /// Put before negative durations
    pub negative: String,
    pub minute: String,
    pub minutes: String,
    pub second: String,
    pub seconds: String,
    /// Put before the delivery time
    pub delivered_start: String,
    /// Put after the delivery time
    pub delivered_end: String,
}

impl Default for Strings {
    fn default() -> Self {
        Strings {
            negative: "-".into(),
            minute: "minute".into(),
            minutes: "minutes".into(),
            second: "second".into(),
            seconds: "seconds".into(),
            delivered_start: "(Delivered after".into(),
            delivered_end: ")".into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    /// Offset at which dates are displayed
    pub utc_offset: UtcOffset,
    pub strings: Strings,
}

impl Default for Options {
    fn default() -> Self {
        Options { utc_offset: UtcOffset::UTC, strings: Strings::default() }
    }
}

/// A header not claimed by any other part of the model
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OtherRow {
    /// Position among other headers, starting at 1
    pub number: usize,
    pub name: String,
    pub value: String,
}

/// Everything learned from a header block
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HeaderModel {
    pub original_headers: String,
    pub header_list: Vec<HeaderField>,
    pub summary: Summary,
    pub forefront_antispam_report: ForefrontAntispamReport,
    pub antispam_report: AntispamReport,
    pub received: ReceivedTimeline,
    pub other_headers: Vec<OtherRow>,
}

impl HeaderModel {
    /// Time the message was written, with delivery time when known
    pub fn creation_time(&self) -> &str {
        self.summary.creation_time()
    }
}

/// Analyze a header block with default options
pub fn parse(headers: &str) -> HeaderModel {
    parse_with(headers, &Options::default())
}

/// Analyze a header block
///
/// This never fails. Malformed input is kept as-is wherever it can't be
/// understood.
pub fn parse_with(headers: &str, options: &Options) -> HeaderModel {
    let header_list = header_list(headers);

    let mut summary = Summary::default();
    let mut forefront_antispam_report = ForefrontAntispamReport::default();
    let mut antispam_report = AntispamReport::default();
    let mut received = vec![];
    let mut other_headers = vec![];

    for field in &header_list {
        if summary.add(field, options.utc_offset) {
            continue;
        }

        if field.name.eq_ignore_ascii_case(ForefrontAntispamReport::HEADER_NAME) {
            forefront_antispam_report.add(&field.value);
        } else if field.name.eq_ignore_ascii_case(AntispamReport::HEADER_NAME) {
            antispam_report.add(&field.value);
        } else if field.name.eq_ignore_ascii_case("Received") {
            received.push(parse_received(&field.value, options.utc_offset));
        } else {
            log::debug!("other header {:?}", field.name);
            other_headers.push(OtherRow {
                number: other_headers.len() + 1,
                name: field.name.clone(),
                value: field.value.clone(),
            });
        }
    }

    let received = compute_deltas(received, &options.strings);
    summary.set_delivery_time(&received.total_time, &options.strings);

    HeaderModel {
        original_headers: headers.to_owned(),
        header_list,
        summary,
        forefront_antispam_report,
        antispam_report,
        received,
        other_headers,
    }
}

/// Parse the body of a single report header
pub fn parse_report<R: Report>(body: &str) -> R {
    report::parse(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::offset;

    const HEADERS: &str = "\
Received: from relay.example.org (relay.example.org [192.0.2.2])\r
\tby mx.example.com with ESMTPS id 2;\r
\tThu, 21 Aug 2014 12:13:48 +0200\r
Received: from sender.example.net by relay.example.org\r
\twith ESMTP id 1; Thu, 21 Aug 2014 10:12:48 +0000\r
X-Forefront-Antispam-Report: CIP:192.0.2.1;CTRY:PL;SFV:NSPM;DIR:INB\r
X-Microsoft-Antispam: BCL:0;\r
Date: Thu, 21 Aug 2014 12:12:40 +0200\r
From: =?UTF-8?Q?Fran=C3=A7ois?= <francois@example.net>\r
Subject: =?ISO-8859-1?Q?Andr=E9?= says hi\r
X-Mailer: test\r
X-Empty:\r
";

    #[test]
    fn end_to_end() {
        let model = parse(HEADERS);

        assert_eq!(model.original_headers, HEADERS);
        assert_eq!(model.header_list.len(), 9);
        assert_eq!(model.summary.get("Subject"), Some("André says hi"));
        assert_eq!(model.summary.get("From"), Some("François <francois@example.net>"));
        assert_eq!(model.creation_time(), "8/21/2014 10:12:40 AM (Delivered after 1 minute)");

        let rows = &model.received.rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hop, 1);
        assert_eq!(rows[0].from.as_deref(), Some("sender.example.net"));
        assert_eq!(rows[0].date_num, Some(1408615968000));
        assert_eq!(rows[0].delay_sort, DelaySort::Unknown);
        assert_eq!(rows[1].hop, 2);
        assert_eq!(rows[1].by.as_deref(), Some("mx.example.com"));
        assert_eq!(rows[1].date_num, Some(1408616028000));
        assert_eq!(rows[1].delay, "1 minute");
        assert_eq!(rows[1].delay_sort, DelaySort::Millis(60_000));
        assert_eq!(rows[1].percent, 100.0);
        assert_eq!(model.received.total_time, "1 minute");

        assert_eq!(model.forefront_antispam_report.cip.value, "192.0.2.1");
        assert_eq!(model.forefront_antispam_report.unparsed.value, "DIR:INB;");
        assert_eq!(model.antispam_report.bcl.value, "0");

        assert_eq!(model.other_headers, [
            OtherRow { number: 1, name: "X-Mailer".into(), value: "test".into() },
            OtherRow { number: 2, name: "X-Empty".into(), value: "".into() },
        ]);
    }

    #[test]
    fn routing_ignores_case() {
        let model = parse("RECEIVED: from a by b; 24 Aug 2014 16:13:38 -0000\n\
            x-microsoft-antispam: PCL:2\nSUBJECT: hi\n");

        assert_eq!(model.received.rows.len(), 1);
        assert_eq!(model.antispam_report.pcl.value, "2");
        assert_eq!(model.summary.get("Subject"), Some("hi"));
        assert!(model.other_headers.is_empty());
    }

    #[test]
    fn text_before_headers_is_other() {
        let model = parse("garbage\nSubject: x");
        assert_eq!(model.other_headers, [
            OtherRow { number: 1, name: "".into(), value: "garbage".into() },
        ]);
    }

    #[test]
    fn options() {
        let options = Options {
            utc_offset: offset!(+2),
            strings: Strings {
                delivered_start: "[in".into(),
                delivered_end: "]".into(),
                ..Strings::default()
            },
        };
        let model = parse_with(HEADERS, &options);

        assert_eq!(model.creation_time(), "8/21/2014 12:12:40 PM [in 1 minute]");
        assert_eq!(model.received.rows[0].date, "8/21/2014 12:12:48 PM");
    }

    #[test]
    fn empty_input() {
        let model = parse("");
        assert!(model.header_list.is_empty());
        assert!(model.received.rows.is_empty());
        assert_eq!(model.received.total_time, "");
        assert_eq!(model.creation_time(), "");
    }

    #[test]
    fn single_report_header() {
        let report: AntispamReport = parse_report("BCL:5;");
        assert_eq!(report.bcl.value, "5");
    }

    #[test]
    fn serializes() {
        let model = parse("Received: from a; garbage\n");
        let json = serde_json::to_value(&model).unwrap();

        assert_eq!(json["received"]["rows"][0]["from"], "a");
        assert_eq!(json["received"]["rows"][0]["for"], serde_json::Value::Null);
        assert_eq!(json["received"]["rows"][0]["delay_sort"], -1);
        assert_eq!(json["forefront_antispam_report"]["custom_spam"]["key"], "X-CustomSpam");
    }
}
