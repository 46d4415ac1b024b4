//! Parsing of the model's list-literal reply.
//!
//! The model is asked for a one-element list of strings. Replies arrive in
//! Python (`['...']`) or JSON (`["..."]`) syntax, sometimes wrapped in a
//! Markdown code fence, occasionally as a bare quoted string.

use crate::error::ExtractError;
use std::iter::Peekable;
use std::str::Chars;

/// Parse a list of string literals. Blank entries are dropped.
pub fn parse_address_list(reply: &str) -> Result<Vec<String>, ExtractError> {
    let body = strip_code_fence(reply.trim());
    let unparsable = || ExtractError::UnparsableReply(reply.trim().to_string());

    let mut chars = body.chars().peekable();
    let items = match chars.peek().copied() {
        Some('[') => {
            chars.next();
            parse_items(&mut chars).ok_or_else(unparsable)?
        }
        Some('\'') | Some('"') => {
            let quote = chars.next().ok_or_else(unparsable)?;
            let item = parse_string(&mut chars, quote).ok_or_else(unparsable)?;
            vec![item]
        }
        _ => return Err(unparsable()),
    };

    if chars.any(|c| !c.is_whitespace()) {
        return Err(unparsable());
    }

    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Items after the opening `[`, consuming the closing `]`.
fn parse_items(chars: &mut Peekable<Chars<'_>>) -> Option<Vec<String>> {
    let mut items = Vec::new();

    loop {
        skip_whitespace(chars);
        match chars.next()? {
            ']' => return Some(items),
            quote @ ('\'' | '"') => items.push(parse_string(chars, quote)?),
            _ => return None,
        }

        skip_whitespace(chars);
        match chars.next()? {
            ',' => continue,
            ']' => return Some(items),
            _ => return None,
        }
    }
}

/// A string body after its opening quote, consuming the closing quote.
fn parse_string(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut out = String::new();

    loop {
        match chars.next()? {
            c if c == quote => return Some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'x' => out.push(hex_escape(chars, 2)?),
                'u' => out.push(unicode_escape(chars)?),
                'U' => out.push(hex_escape(chars, 8)?),
                // Named escapes (`\N{...}`) would need the Unicode name table.
                'N' => return None,
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
}

/// Exactly `digits` hex digits as one code point.
fn hex_escape(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<char> {
    char::from_u32(hex_value(chars, digits)?)
}

/// `\uXXXX`, joining a JSON surrogate pair into one code point.
fn unicode_escape(chars: &mut Peekable<Chars<'_>>) -> Option<char> {
    let high = hex_value(chars, 4)?;
    if !(0xD800..0xDC00).contains(&high) {
        return char::from_u32(high);
    }

    if chars.next()? != '\\' || chars.next()? != 'u' {
        return None;
    }
    let low = hex_value(chars, 4)?;
    if !(0xDC00..0xE000).contains(&low) {
        return None;
    }
    char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
}

fn hex_value(chars: &mut Peekable<Chars<'_>>, digits: usize) -> Option<u32> {
    (0..digits).try_fold(0u32, |acc, _| Some(acc * 16 + chars.next()?.to_digit(16)?))
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Remove a surrounding ```` ``` ```` fence (with optional language tag).
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the language tag line, if any.
    match inner.split_once('\n') {
        Some((tag, rest)) if !tag.contains('[') => rest.trim(),
        _ => inner.trim(),
    }
}
