// Copyright 2022 OpenStax Poland
// Licensed under the MIT license. See LICENSE file in the project root for
// full license text.

//! Scanning of header values for RFC 2047 encoded-words

use memchr::{memchr, memmem};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use super::encoding::WordEncoding;

/// White space between two adjacent encoded-words
static SPACE_BETWEEN_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?=\s+=\?").unwrap());

/// Span of a header value: either literal text or one encoded-word
#[derive(Clone, Debug, PartialEq, Eq)]
enum Block<'a> {
    Literal(&'a str),
    Word {
        charset: &'a str,
        encoding: WordEncoding,
        text: Cow<'a, str>,
    },
}

/// Decode all encoded-words in a header value
///
/// Text which is not an encoded-word, and encoded-words which can't be
/// decoded, are passed through unchanged. Decoded bytes are not filtered;
/// NUL, CR and LF survive decoding.
pub fn clean_2047_encoding(value: &str) -> String {
    if memmem::find(value.as_bytes(), b"=?").is_none() {
        return value.to_owned();
    }

    // RFC 2047 section 6.2: white space between adjacent encoded-words is
    // not displayed
    let value = SPACE_BETWEEN_WORDS.replace_all(value, "?==?");

    merge_quoted(split_blocks(&value))
        .into_iter()
        .map(|block| match block {
            Block::Literal(text) => Cow::from(text),
            Block::Word { charset, encoding, text } => Cow::from(encoding.decode(charset, &text)),
        })
        .collect()
}

/// Split `value` into encoded-words and the literal text between them
fn split_blocks(value: &str) -> Vec<Block> {
    let mut blocks = vec![];
    let mut rest = value;

    while !rest.is_empty() {
        let (start, end) = match next_word(rest) {
            Some(span) => span,
            None => {
                blocks.push(Block::Literal(rest));
                break;
            }
        };

        if start > 0 {
            blocks.push(Block::Literal(&rest[..start]));
        }

        match parse_word(&rest[start..end]) {
            Some(word) => {
                blocks.push(word);
                rest = &rest[end..];
            }
            // Not a word after all, but a real one may start inside it
            None => {
                blocks.push(Block::Literal(&rest[start..start + 2]));
                rest = &rest[start + 2..];
            }
        }
    }

    blocks
}

/// Find the next candidate encoded-word in `text`
///
/// The candidate starts at the first `=?` and ends after the last `?=`
/// which comes before the next `=?`. Search for that next `=?` begins only
/// after the closing `?=` of the candidate's encoded text, so that a `=`
/// ending the encoded text (Base64 padding, or a Q escape) is not taken
/// for the start of another word.
fn next_word(text: &str) -> Option<(usize, usize)> {
    let data = text.as_bytes();
    let start = memmem::find(data, b"=?")?;
    let charset_end = start + 2 + memchr(b'?', &data[start + 2..])?;
    let encoding_end = charset_end + 1 + memchr(b'?', &data[charset_end + 1..])?;
    let first_close = encoding_end + 1 + memmem::find(&data[encoding_end + 1..], b"?=")?;
    let next_start = memmem::find(&data[first_close + 2..], b"=?")
        .map_or(data.len(), |inx| first_close + 2 + inx);
    let last_close = first_close + memmem::rfind(&data[first_close..next_start], b"?=")?;
    Some((start, last_close + 2))
}

/// Parse `=?charset?encoding?text?=`
///
/// Returns `None` unless there are exactly three fields and the encoding is
/// a single known letter.
fn parse_word(token: &str) -> Option<Block> {
    let inner = token.strip_prefix("=?")?.strip_suffix("?=")?;
    let mut fields = inner.split('?');

    let charset = fields.next()?;
    let encoding = fields.next()?;
    let text = fields.next()?;

    if fields.next().is_some() || encoding.len() != 1 {
        log::trace!("not an encoded-word: {token:?}");
        return None;
    }

    // RFC 2231 section 5: charset*language
    let charset = charset.split('*').next().unwrap_or(charset);

    Some(Block::Word {
        charset,
        encoding: WordEncoding::from_letter(encoding)?,
        text: Cow::from(text),
    })
}

/// Join runs of adjacent Q encoded-words with the same charset
///
/// Senders split multi-byte characters across encoded-words, so the text is
/// concatenated before it is decoded.
fn merge_quoted(blocks: Vec<Block>) -> Vec<Block> {
    let mut result: Vec<Block> = Vec::with_capacity(blocks.len());

    for block in blocks {
        if let (
            Some(Block::Word { charset: prev_charset, encoding: WordEncoding::Quoted, text: prev_text }),
            Block::Word { charset, encoding: WordEncoding::Quoted, text },
        ) = (result.last_mut(), &block) {
            if prev_charset.eq_ignore_ascii_case(charset) {
                prev_text.to_mut().push_str(text);
                continue;
            }
        }

        result.push(block);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_text() {
        assert_eq!(clean_2047_encoding(""), "");
        assert_eq!(clean_2047_encoding("Hello World"), "Hello World");
        assert_eq!(clean_2047_encoding("what?= =?no"), "what?==?no");
    }

    #[test]
    fn single_words() {
        assert_eq!(clean_2047_encoding("=?UTF-8?B?SGVsbG8gV29ybGQ=?="), "Hello World");
        assert_eq!(clean_2047_encoding("=?ISO-8859-1?Q?Andr=E9?="), "André");
        assert_eq!(clean_2047_encoding("Re: =?UTF-8?B?SGVsbG8=?= World"), "Re: Hello World");
        assert_eq!(
            clean_2047_encoding("=?UTF-8?Q?Fran=C3=A7ois_Dupr=C3=A9?= <francois@example.com>"),
            "François Dupré <francois@example.com>",
        );
    }

    #[test]
    fn language_suffix() {
        assert_eq!(clean_2047_encoding("=?US-ASCII*EN?Q?Keith_Moore?="), "Keith Moore");
    }

    #[test]
    fn space_between_words() {
        // RFC 2047 section 8
        assert_eq!(clean_2047_encoding("(=?ISO-8859-1?Q?a?= b)"), "(a b)");
        assert_eq!(clean_2047_encoding("(=?ISO-8859-1?Q?a?= =?ISO-8859-1?Q?b?=)"), "(ab)");
        assert_eq!(clean_2047_encoding("(=?ISO-8859-1?Q?a?=  \t =?ISO-8859-1?Q?b?=)"), "(ab)");
        assert_eq!(clean_2047_encoding("(=?ISO-8859-1?Q?a_b?=)"), "(a b)");
        assert_eq!(
            clean_2047_encoding("(=?ISO-8859-1?Q?a?= =?ISO-8859-2?Q?_b?=)"),
            "(a b)",
        );
    }

    #[test]
    fn rfc_sample() {
        assert_eq!(
            clean_2047_encoding("=?ISO-8859-1?B?SWYgeW91IGNhbiByZWFkIHRoaXMgeW8=?= \
                =?ISO-8859-2?B?dSB1bmRlcnN0YW5kIHRoZSBleGFtcGxlLg==?="),
            "If you can read this you understand the example.",
        );
    }

    #[test]
    fn merges_adjacent_quoted_words() {
        // € split across two words; neither half is valid UTF-8 alone
        assert_eq!(clean_2047_encoding("=?UTF-8?Q?=E2=82?= =?utf-8?Q?=AC?="), "€");
        assert_eq!(
            split_blocks("=?UTF-8?Q?a?==?UTF-8?Q?b?=x=?UTF-8?Q?c?=").len(),
            4,
        );
        assert_eq!(
            merge_quoted(split_blocks("=?UTF-8?Q?a?==?UTF-8?Q?b?=x=?UTF-8?Q?c?=")),
            vec![
                Block::Word {
                    charset: "UTF-8",
                    encoding: WordEncoding::Quoted,
                    text: Cow::from("ab"),
                },
                Block::Literal("x"),
                Block::Word {
                    charset: "UTF-8",
                    encoding: WordEncoding::Quoted,
                    text: Cow::from("c"),
                },
            ],
        );
    }

    #[test]
    fn does_not_merge_base64() {
        assert_eq!(
            clean_2047_encoding("=?UTF-8?B?4oI=?= =?UTF-8?B?rA==?="),
            "=?UTF-8?B?4oI=?==?UTF-8?B?rA==?=",
        );
    }

    #[test]
    fn keeps_control_bytes() {
        assert_eq!(clean_2047_encoding("=?utf-8?Q?=00=0A=41?=test3"), "\0\nAtest3");
        assert_eq!(clean_2047_encoding("=?utf-8?b?dGVzdAA=?=test"), "test\0test");
    }

    #[test]
    fn mailsploit() {
        assert_eq!(
            clean_2047_encoding("=?utf-8?b?cG90dXNAd2hpdGVob3VzZS5nb3Y=?==?utf-8?Q?=00?==?utf-8?b?cG90dXNAd2hpdGVob3VzZS5nb3Y=?=@mailsploit.com"),
            "potus@whitehouse.gov\0potus@whitehouse.gov@mailsploit.com",
        );
        assert_eq!(
            clean_2047_encoding("=?utf-8?Q?=42=45=47=49=4E=20=2F=20=0A=20=2F=20=45=4E=44?="),
            "BEGIN / \n / END",
        );
    }

    #[test]
    fn malformed_words_pass_through() {
        assert_eq!(clean_2047_encoding("=?UTF-8?B?RU5E=?="), "=?UTF-8?B?RU5E=?=");
        assert_eq!(clean_2047_encoding("=?UTF-8?X?abc?="), "=?UTF-8?X?abc?=");
        assert_eq!(clean_2047_encoding("=?UTF-8?BQ?abc?="), "=?UTF-8?BQ?abc?=");
        assert_eq!(clean_2047_encoding("=?UTF-8?Q?a?=b?= c"), "=?UTF-8?Q?a?=b?= c");
        assert_eq!(clean_2047_encoding("=?UTF-8?Q?unterminated"), "=?UTF-8?Q?unterminated");
        assert_eq!(clean_2047_encoding("x =?UTF-8"), "x =?UTF-8");
    }

    #[test]
    fn stray_marker_before_word() {
        assert_eq!(clean_2047_encoding("Price =? =?UTF-8?Q?x?="), "Price =? x");
        assert_eq!(clean_2047_encoding("a=?b =?UTF-8?B?SGk=?="), "a=?b Hi");
        assert_eq!(clean_2047_encoding("=?=?UTF-8?Q?x?= y"), "=?x y");
    }

    proptest! {
        #[test]
        fn text_without_words_is_unchanged(
            text in any::<String>().prop_filter("contains =?", |text| !text.contains("=?")),
        ) {
            prop_assert_eq!(clean_2047_encoding(&text), text);
        }

        #[test]
        fn never_panics(text in "[=?a-zA-Z0-9_ ]{0,64}") {
            clean_2047_encoding(&text);
        }
    }
}
