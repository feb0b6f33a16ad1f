// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Analysis of internet message headers
//!
//! A raw header block is unfolded into fields, encoded-words are decoded,
//! `Received:` headers are turned into a relay timeline with delays between
//! hops, and anti-spam reports are split into their known fields. Nothing
//! here fails: input which can't be understood is kept as-is.

#[macro_use]
mod macros;

pub mod mail;
pub mod mime;
pub mod report;
mod syntax;
mod util;

pub use self::mail::{parse, parse_with, HeaderModel, Options, Strings};
