//! `{path.N}` placeholder expansion.
//!
//! `N` is a zero based index into the values captured by wildcard segments.
//! Tokens whose index is malformed or out of range stay in the output as
//! literal text.

use std::borrow::Cow;

use crate::matcher::PathParams;

const TOKEN_PREFIX: &str = "{path.";
const TOKEN_SUFFIX: char = '}';

/// Replaces every resolvable `{path.N}` token in `input`.
pub fn expand<'a>(input: &'a str, params: &PathParams) -> Cow<'a, str> {
    if !input.contains(TOKEN_PREFIX) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(TOKEN_PREFIX) {
        out.push_str(&rest[..start]);
        let after = &rest[start + TOKEN_PREFIX.len()..];

        match resolve(after, params) {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &after[consumed..];
            }
            None => {
                out.push_str(TOKEN_PREFIX);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Reads `N}` from the text following a token prefix. Returns the captured
/// value and the number of bytes the index and closing brace occupy.
fn resolve<'p>(after: &str, params: &'p PathParams) -> Option<(&'p str, usize)> {
    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || !after[digits..].starts_with(TOKEN_SUFFIX) {
        return None;
    }

    let index: usize = after[..digits].parse().ok()?;
    params
        .get(index)
        .map(|value| (value, digits + TOKEN_SUFFIX.len_utf8()))
}
