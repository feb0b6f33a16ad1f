// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Utilities for parsing

use std::{borrow::Cow, ops, str};
use thiserror::Error;

use crate::util;

pub type Result<T, E = SyntaxError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
#[error("at {offset} - {kind}")]
pub struct SyntaxError {
    pub offset: usize,
    #[source]
    pub kind: SyntaxErrorKind,
}

#[derive(Debug, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {:?}", util::maybe_ascii(.0))]
    Expected(&'static [u8]),
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

impl SyntaxErrorKind {
    pub fn custom(message: impl Into<Cow<'static, str>>) -> Self {
        SyntaxErrorKind::Custom(message.into())
    }

    pub fn at(self, offset: usize) -> SyntaxError {
        SyntaxError { offset, kind: self }
    }
}

impl From<&'static str> for SyntaxErrorKind {
    fn from(error: &'static str) -> Self {
        SyntaxErrorKind::custom(error)
    }
}

impl From<String> for SyntaxErrorKind {
    fn from(error: String) -> Self {
        SyntaxErrorKind::custom(error)
    }
}

#[derive(Clone, Copy)]
pub struct Buffer<'a> {
    offset: usize,
    data: &'a [u8],
}

impl<'a> Buffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Buffer { offset: 0, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Offset of this slice from the start of the original data
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn error<T>(&self, kind: impl Into<SyntaxErrorKind>) -> Result<T> {
        Err(kind.into().at(self.offset))
    }

    /// Advance this slice by `number` positions
    pub fn advance(&mut self, number: usize) {
        self.offset += number;
        self.data = &self.data[number..];
    }

    pub fn take(&mut self, number: usize) -> &'a [u8] {
        let value = &self.data[..number];
        self.advance(number);
        value
    }

    /// Execute `f`, advancing `self` only if it succeeds
    pub fn atomic<T: 'a>(&mut self, f: impl FnOnce(&mut Buffer<'a>) -> Result<T>) -> Result<T> {
        let mut cursor = *self;
        let value = f(&mut cursor)?;
        *self = cursor;
        Ok(value)
    }

    /// Return `Ok(())` and advance this slice if it begins with `needle`
    pub fn expect(&mut self, needle: &'static [u8]) -> Result<()> {
        if self.data.starts_with(needle) {
            self.advance(needle.len());
            Ok(())
        } else {
            self.error(SyntaxErrorKind::Expected(needle))
        }
    }

    /// Return longest prefix whose characters match `test`, advancing this
    /// slice by its length
    pub fn take_while(&mut self, mut test: impl FnMut(u8, usize) -> bool) -> &'a [u8] {
        let mut length = 0;

        while length < self.len() && test(self.data[length], length) {
            length += 1;
        }

        self.take(length)
    }

    /// Like [`Buffer::take_while`], but for runs of ASCII bytes which are
    /// known to be valid UTF-8
    pub fn take_ascii_while(&mut self, mut test: impl FnMut(u8) -> bool) -> &'a str {
        let value = self.take_while(|b, _| b.is_ascii() && test(b));
        // ASCII is always valid UTF-8
        str::from_utf8(value).unwrap_or_default()
    }

    /// Execute `f`, advancing `self` only if it succeeds
    pub fn maybe<T: 'a>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        self.atomic(f).ok()
    }
}

impl ops::Deref for Buffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

pub fn read_number<T>(buf: &mut Buffer, radix: u32, min_digits: usize, max_digits: usize) -> Result<T>
where
    T: TryFrom<u32> + 'static,
    T::Error: std::fmt::Display,
{
    buf.atomic(|buf| {
        let mut value: u32 = 0;
        let mut count = 0;

        while count < max_digits {
            let digit = match buf.first().and_then(|&b| char::from(b).to_digit(radix)) {
                Some(digit) => digit,
                None => break,
            };
            value = value * radix + digit;
            count += 1;
            buf.advance(1);
        }

        if count < min_digits {
            buf.error(format!("expected at least {} digit{}", min_digits,
                if min_digits == 1 { "" } else { "s" }))
        } else {
            T::try_from(value).map_err(|err| SyntaxErrorKind::custom(err.to_string()).at(buf.offset))
        }
    })
}
