// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

use std::fmt;

use crate::syntax::{self, SyntaxErrorKind};

/// Render bytes for log and error output, escaping everything that is not
/// printable ASCII
///
/// Header values may carry NUL, CR, LF and other control bytes injected by
/// hostile senders. They must be kept in the parsed model, but not written
/// raw into a terminal or log file.
pub fn maybe_ascii(data: &(impl AsRef<[u8]> + ?Sized)) -> MaybeAscii<'_> {
    MaybeAscii(data.as_ref())
}

pub struct MaybeAscii<'a>(&'a [u8]);

impl MaybeAscii<'_> {
    fn write_escaped(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for &byte in self.0 {
            match byte {
                b'\0' => f.write_str("\\0")?,
                b'\r' => f.write_str("\\r")?,
                b'\n' => f.write_str("\\n")?,
                b'\t' => f.write_str("\\t")?,
                b'"' | b'\\' => write!(f, "\\{}", byte as char)?,
                0x20..=0x7e => write!(f, "{}", byte as char)?,
                _ => write!(f, "\\x{:02x}", byte)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for MaybeAscii<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_escaped(f)
    }
}

impl fmt::Debug for MaybeAscii<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("\"")?;
        self.write_escaped(f)?;
        f.write_str("\"")
    }
}

/// Assign a value which may only be given once
pub trait SetOnce<T> {
    fn set_once(&mut self, offset: usize, name: &'static str, value: T) -> syntax::Result<()>;
}

impl<T> SetOnce<T> for Option<T> {
    fn set_once(&mut self, offset: usize, name: &'static str, value: T) -> syntax::Result<()> {
        if self.is_some() {
            Err(SyntaxErrorKind::custom(format!("duplicate {name}")).at(offset))
        } else {
            *self = Some(value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_injected_bytes() {
        assert_eq!(maybe_ascii("a\0b\r\nc").to_string(), "a\\0b\\r\\nc");
        assert_eq!(format!("{:?}", maybe_ascii(b"\"\x7f")), "\"\\\"\\x7f\"");
        assert_eq!(maybe_ascii("é").to_string(), "\\xc3\\xa9");
    }

    #[test]
    fn set_once() {
        let mut value = None;
        assert!(value.set_once(0, "year", 2014).is_ok());
        let err = value.set_once(7, "year", 2015).unwrap_err();
        assert_eq!(err.to_string(), "at 7 - duplicate year");
        assert_eq!(value, Some(2014));
    }
}
