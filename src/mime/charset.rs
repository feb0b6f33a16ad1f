// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

use encoding_rs::{Encoding, UTF_8};
use std::borrow::Cow;
use thiserror::Error;

/// Byte-to-text decoding scheme selected by a charset name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Charset(&'static Encoding);

#[derive(Debug, Error)]
#[error("malformed {0} text data")]
pub struct CharsetError(&'static str);

impl Charset {
    pub const UTF_8: Charset = Charset(UTF_8);

    /// Look up a charset by its name, ignoring case
    ///
    /// Labels are resolved as web browsers do (`US-ASCII` and `ISO-8859-1`
    /// decode as Windows-1252, `GB2312` as GBK, …). Names which are not
    /// recognized fall back to UTF-8; mail in the wild frequently declares
    /// charsets which do not exist.
    pub fn by_name(name: &str) -> Charset {
        match Encoding::for_label(name.trim().as_bytes()) {
            Some(encoding) => Charset(encoding),
            None => {
                log::trace!("unknown charset {name:?}, decoding as UTF-8");
                Charset::UTF_8
            }
        }
    }

    pub fn name(self) -> &'static str {
        self.0.name()
    }

    /// Decode `data`, failing on byte sequences which are not valid in this
    /// charset
    ///
    /// No bytes are dropped or normalized; NUL and other control characters
    /// come through as-is.
    pub fn decode(self, data: &[u8]) -> Result<Cow<str>, CharsetError> {
        self.0
            .decode_without_bom_handling_and_without_replacement(data)
            .ok_or(CharsetError(self.0.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_names() {
        assert_eq!(Charset::by_name("utf-8").name(), "UTF-8");
        assert_eq!(Charset::by_name("UTF-8").name(), "UTF-8");
        assert_eq!(Charset::by_name("Windows-1252").name(), "windows-1252");
        assert_eq!(Charset::by_name("iso-8859-1").name(), "windows-1252");
        assert_eq!(Charset::by_name("us-ascii").name(), "windows-1252");
        assert_eq!(Charset::by_name("ISO-8859-8").name(), "ISO-8859-8");
        assert_eq!(Charset::by_name("GB2312").name(), "GBK");
    }

    #[test]
    fn unknown_names_fall_back_to_utf8() {
        assert_eq!(Charset::by_name("x-no-such-charset"), Charset::UTF_8);
        assert_eq!(Charset::by_name(""), Charset::UTF_8);
    }

    #[test]
    fn decodes_codepages() {
        assert_eq!(Charset::by_name("ISO-8859-1").decode(b"Andr\xe9").unwrap(), "André");
        assert_eq!(Charset::by_name("ISO-8859-8").decode(b"\xf9\xec\xe5\xed").unwrap(), "שלום");
        assert_eq!(Charset::by_name("GB2312").decode(b"\xc4\xe3\xba\xc3").unwrap(), "你好");
        assert_eq!(Charset::by_name("Windows-1252").decode(b"\x80").unwrap(), "€");
    }

    #[test]
    fn keeps_control_bytes() {
        assert_eq!(Charset::UTF_8.decode(b"\0\r\nA").unwrap(), "\0\r\nA");
    }

    #[test]
    fn rejects_malformed_data() {
        assert!(Charset::UTF_8.decode(b"\xe2\x82").is_err());
    }
}
