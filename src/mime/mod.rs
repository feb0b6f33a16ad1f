// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Implementation of [RFC 2047](https://datatracker.ietf.org/doc/html/rfc2047):
//! MIME Part Three: Message Header Extensions for Non-ASCII Text

pub mod charset;
pub mod encoding;
pub mod word;

pub use self::{
    charset::Charset,
    encoding::{decode_base64, decode_quoted_printable, WordEncoding},
    word::clean_2047_encoding,
};
