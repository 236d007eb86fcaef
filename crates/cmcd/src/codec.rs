//! CMCD line protocol: `key=value` pairs separated by commas.
//!
//! Parsing is lenient. A token that cannot be understood is dropped and the
//! rest of the string is still used, so a malformed inbound header never
//! costs the whole report.

use tracing::trace;

use crate::value::{CmcdFields, CmcdValue, format_number};

/// Parses a CMCD-encoded string into a field map.
///
/// * `key=value` tokens split on the first `=`.
/// * Bare `key` tokens become boolean `true`.
/// * Double-quoted values are strings with `\"` and `\\` unescaped.
/// * Unquoted values that survive a number round-trip become numbers,
///   anything else is kept verbatim as a string.
/// * Tokens with an empty key are skipped.
pub fn parse_cmcd(input: &str) -> CmcdFields {
    let mut fields = CmcdFields::new();

    for token in input.split(',') {
        let (key, value) = match token.split_once('=') {
            Some((key, raw)) => (key.trim(), parse_value(raw)),
            None => (token.trim(), CmcdValue::Bool(true)),
        };

        if key.is_empty() {
            if !token.trim().is_empty() {
                trace!(token, "Skipping CMCD token without a key");
            }
            continue;
        }

        fields.insert(key.to_owned(), value);
    }

    fields
}

fn parse_value(raw: &str) -> CmcdValue {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return CmcdValue::String(unescape(&raw[1..raw.len() - 1]));
    }

    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() && format_number(number) == trimmed => {
            CmcdValue::number(number).unwrap_or_else(|| CmcdValue::String(raw.to_owned()))
        }
        _ => CmcdValue::String(raw.to_owned()),
    }
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => out.push(next),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '\\' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Serializes fields to the CMCD line protocol.
///
/// Keys come out in sorted order. Strings are quoted and escaped, `true`
/// renders as a bare key and `false` is omitted.
pub fn encode_cmcd(fields: &CmcdFields) -> String {
    let mut pairs = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            CmcdValue::Bool(true) => pairs.push(key.clone()),
            CmcdValue::Bool(false) => {}
            CmcdValue::String(s) => pairs.push(format!("{key}=\"{}\"", escape(s))),
            number => pairs.push(format!("{key}={number}")),
        }
    }
    pairs.join(",")
}
