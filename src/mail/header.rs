// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Splitting of a raw header block into unfolded, decoded fields

use serde::Serialize;

use crate::{mime, util};

/// One logical header field
///
/// `name` is empty for text found before the first recognizable field.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

impl HeaderField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        HeaderField { name: name.into(), value: value.into() }
    }
}

/// Split a header block into fields
///
/// Folding is not taken strictly: leading white space on continuation lines
/// is often lost when headers are copied around, so any line which does not
/// start with `name:` continues the previous field.
pub fn header_list(headers: &str) -> Vec<HeaderField> {
    let mut fields: Vec<HeaderField> = vec![];

    for line in headers.split(|c: char| c == '\r' || c == '\n') {
        if let Some((name, value)) = field_start(line) {
            fields.push(HeaderField::new(name, value));
            continue;
        }

        match fields.last_mut() {
            Some(field) => {
                let line = line.trim_start();

                if line.is_empty() {
                    continue;
                }

                if !field.value.is_empty() {
                    field.value.push(' ');
                }
                field.value.push_str(line);
            }
            None => {
                if !line.trim().is_empty() {
                    fields.push(HeaderField::new("", line));
                }
            }
        }
    }

    for field in &mut fields {
        let value = mime::clean_2047_encoding(&field.value).replace('\0', "");
        let value = value.trim_end_matches(|c: char| c == '\r' || c == '\n');

        if value != field.value {
            log::trace!("decoded {}: {:?}", field.name, util::maybe_ascii(value));
        }

        field.value = value.to_owned();
    }

    fields
}

/// Recognize `name: value` at the start of a line
fn field_start(line: &str) -> Option<(&str, &str)> {
    let length = line.bytes()
        .take_while(|&b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
        .count();

    if length == 0 || line.as_bytes().get(length) != Some(&b':') {
        return None;
    }

    let name = &line[..length];

    // A folded time of day, such as `16:20:05 -0400`
    if length <= 2 && name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value = line[length + 1..].trim_start_matches(|c: char| c == ' ' || c == '\t');
    Some((name, value))
}
