// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Structured `key:value;` report headers
//!
//! Anti-spam filters summarize their verdicts in headers such as
//! `X-Forefront-Antispam-Report: CIP:192.0.2.1;CTRY:PL;SFV:NSPM;`. Each
//! report type has a fixed set of known keys; pairs with other keys are
//! collected verbatim so nothing is lost.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub use self::antispam::{AntispamReport, ForefrontAntispamReport};

mod antispam;

static SEMICOLONS: Lazy<Regex> = Lazy::new(|| Regex::new(r";+").unwrap());

/// One known field of a report
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub key: &'static str,
    pub label: &'static str,
    pub source_header_name: &'static str,
    pub value: String,
}

impl ReportRow {
    pub fn new(key: &'static str, label: &'static str, source_header_name: &'static str) -> Self {
        ReportRow { key, label, source_header_name, value: String::new() }
    }
}

/// A report schema
///
/// Implemented by structures declared with `report_schema!`.
pub trait Report: Default {
    /// Name of the header carrying this report
    const HEADER_NAME: &'static str;

    /// All rows in display order, ending with the source and unparsed rows
    fn rows(&self) -> Vec<&ReportRow>;

    /// Rows of known keys
    fn fields_mut(&mut self) -> Vec<&mut ReportRow>;

    fn source_mut(&mut self) -> &mut ReportRow;

    fn unparsed_mut(&mut self) -> &mut ReportRow;

    /// Value of the row with `key`, ignoring case
    fn get(&self, key: &str) -> Option<&str> {
        self.rows()
            .into_iter()
            .find(|row| row.key.eq_ignore_ascii_case(key))
            .map(|row| row.value.as_str())
    }

    /// Read `body` into this report
    ///
    /// Values for keys already set are appended to, separated with `"; "`.
    fn add(&mut self, body: &str) {
        let mut fields = self.fields_mut();
        let index: BTreeMap<String, usize> = fields.iter()
            .enumerate()
            .map(|(inx, row)| (row.key.to_ascii_uppercase(), inx))
            .collect();

        let mut unparsed = String::new();

        for segment in clean(body).split(';') {
            let segment = segment.trim();

            let (key, value) = match segment.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => {
                    if !segment.is_empty() {
                        unparsed.push_str(segment);
                        unparsed.push(';');
                    }
                    continue;
                }
            };

            if key.is_empty() {
                continue;
            }

            match index.get(&key.to_ascii_uppercase()) {
                Some(&inx) => append(&mut fields[inx].value, value),
                None => {
                    unparsed.push_str(key);
                    unparsed.push(':');
                    unparsed.push_str(value);
                    unparsed.push(';');
                }
            }
        }

        if !unparsed.is_empty() {
            log::debug!("unknown keys in {}: {unparsed:?}", Self::HEADER_NAME);
        }

        self.source_mut().value = body.to_owned();
        self.unparsed_mut().value.push_str(&unparsed);
    }
}

/// Parse a report body
pub fn parse<R: Report>(body: &str) -> R {
    let mut report = R::default();
    report.add(body);
    report
}

/// Drop `(null)` placeholders and empty fields, and terminate the last field
fn clean(body: &str) -> String {
    let cleaned = format!("{};", body.replace("(null)", ""));
    SEMICOLONS.replace_all(&cleaned, ";").into_owned()
}

fn append(existing: &mut String, value: &str) {
    if value.is_empty() {
        return;
    }

    if !existing.is_empty() {
        existing.push_str("; ");
    }

    existing.push_str(value);
}
