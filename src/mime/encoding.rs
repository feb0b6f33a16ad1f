// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Decoding of the text of a single RFC 2047 encoded-word

use std::{error::Error, fmt};

use crate::util;
use super::charset::{Charset, CharsetError};

/// Encoding letter of an encoded-word
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WordEncoding {
    /// `B`
    Base64,
    /// `Q`
    Quoted,
}

impl WordEncoding {
    pub fn from_letter(letter: &str) -> Option<WordEncoding> {
        match_ignore_ascii_case! { letter;
            "B" => Some(WordEncoding::Base64),
            "Q" => Some(WordEncoding::Quoted),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            WordEncoding::Base64 => 'B',
            WordEncoding::Quoted => 'Q',
        }
    }

    /// Decode `text` and interpret the result in `charset`
    ///
    /// This never fails: when the text can't be decoded the encoded-word is
    /// returned in its source form, `=?charset?B?text?=`.
    pub fn decode(self, charset: &str, text: &str) -> String {
        let result = match self {
            WordEncoding::Base64 => base64_bytes(text),
            WordEncoding::Quoted => quoted_bytes(text),
        }.and_then(|data| Ok(Charset::by_name(charset).decode(&data)?.into_owned()));

        match result {
            Ok(text) => text,
            Err(err) => {
                log::trace!("leaving encoded-word {:?} as-is: {err}",
                    util::maybe_ascii(text));
                format!("=?{charset}?{}?{text}?=", self.letter())
            }
        }
    }
}

/// Decode Base64 encoded-word text in `charset`
pub fn decode_base64(charset: &str, text: &str) -> String {
    WordEncoding::Base64.decode(charset, text)
}

/// Decode Q encoded-word text in `charset`
pub fn decode_quoted_printable(charset: &str, text: &str) -> String {
    WordEncoding::Quoted.decode(charset, text)
}

fn base64_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    check_base64(text.as_bytes())?;
    Ok(base64::decode(text)?)
}

/// Only accept complete four-character quanta, with padding at the very end
fn check_base64(data: &[u8]) -> Result<(), DecodeError> {
    if data.len() % 4 != 0 {
        return Err(DecodeErrorKind::IncompleteQuantum.into());
    }

    let content = match data {
        [rest @ .., b'=', b'='] | [rest @ .., b'='] => rest,
        _ => data,
    };

    if content.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/') {
        Ok(())
    } else {
        Err(DecodeErrorKind::IllegalCharacter.into())
    }
}

fn quoted_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut result = Vec::with_capacity(text.len());
    let mut rest = text.as_bytes();

    while let Some(inx) = rest.iter().position(|&b| matches!(b, b'=' | b'_')) {
        result.extend_from_slice(&rest[..inx]);

        if rest[inx] == b'_' {
            result.push(b' ');
            rest = &rest[inx + 1..];
            continue;
        }

        let byte = match rest.get(inx + 1..inx + 3) {
            Some(&[h, l]) => match (char::from(h).to_digit(16), char::from(l).to_digit(16)) {
                (Some(h), Some(l)) => (h * 16 + l) as u8,
                _ => return Err(DecodeErrorKind::InvalidEscapeSequence.into()),
            },
            _ => return Err(DecodeErrorKind::InvalidEscapeSequence.into()),
        };

        result.push(byte);
        rest = &rest[inx + 3..];
    }

    result.extend_from_slice(rest);

    Ok(result)
}

#[derive(Debug)]
pub struct DecodeError(DecodeErrorKind);

#[derive(Debug)]
enum DecodeErrorKind {
    Base64(base64::DecodeError),
    Charset(CharsetError),
    IncompleteQuantum,
    InvalidEscapeSequence,
    IllegalCharacter,
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(error: DecodeErrorKind) -> Self {
        DecodeError(error)
    }
}

impl From<base64::DecodeError> for DecodeError {
    fn from(error: base64::DecodeError) -> Self {
        DecodeErrorKind::Base64(error).into()
    }
}

impl From<CharsetError> for DecodeError {
    fn from(error: CharsetError) -> Self {
        DecodeErrorKind::Charset(error).into()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            DecodeErrorKind::Base64(ref error) => error.fmt(f),
            DecodeErrorKind::Charset(ref error) => error.fmt(f),
            DecodeErrorKind::IncompleteQuantum => f.write_str("incomplete base64 quantum"),
            DecodeErrorKind::InvalidEscapeSequence => f.write_str("invalid escape sequence"),
            DecodeErrorKind::IllegalCharacter => f.write_str("illegal character"),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self.0 {
            DecodeErrorKind::Base64(ref error) => Some(error),
            DecodeErrorKind::Charset(ref error) => Some(error),
            _ => None,
        }
    }
}
