//! Escaping of HTML for embedding inside a JavaScript template literal.
//!
//! A template literal ends at an unescaped backtick and interpolates `${`,
//! and a backslash starts an escape sequence. All three are escaped so the
//! literal evaluates back to exactly the original text. Raw carriage returns
//! are escaped too, since evaluation normalizes CR and CRLF to LF.

use crate::errors::BundleError;

/// Escape `source` so it can be placed verbatim between backticks
pub fn escape_template(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 16);
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\r' => out.push_str("\\r"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }

    out
}

/// Evaluate the body of a template literal produced by [`escape_template`].
///
/// The common single-character escapes found in hand-written bundles are
/// accepted too, and raw CR / CRLF line breaks read as LF the way the browser
/// evaluates them. An unescaped `${` would be evaluated by the browser and
/// cannot be reproduced here, so it is rejected.
pub fn unescape_template(body: &str) -> Result<String, BundleError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next().ok_or_else(|| {
                    BundleError::Malformed("template literal ends with a lone backslash".into())
                })?;
                match escaped {
                    '\\' | '`' | '$' | '{' | '\'' | '"' => out.push(escaped),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    '\n' | '\u{2028}' | '\u{2029}' => {}
                    '\r' => {
                        if chars.peek() == Some(&'\n') {
                            chars.next();
                        }
                    }
                    other => {
                        return Err(BundleError::Malformed(format!(
                            "unsupported escape sequence \\{} in template literal",
                            other
                        )))
                    }
                }
            }
            '$' if chars.peek() == Some(&'{') => {
                return Err(BundleError::Malformed(
                    "template literal contains an interpolation".into(),
                ))
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Split `input`, which starts just after an opening backtick, into the raw
/// literal body and the text following the closing backtick.
pub(crate) fn split_template_literal(input: &str) -> Result<(&str, &str), BundleError> {
    let mut escaped = false;
    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '`' => return Ok((&input[..idx], &input[idx + 1..])),
            _ => {}
        }
    }

    Err(BundleError::Malformed(
        "unterminated template literal".into(),
    ))
}
