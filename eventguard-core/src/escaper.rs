//! escaper.rs - Normalizes outgoing text into a constrained safe charset.
//!
//! Three escaping contexts exist, from loosest to strictest:
//!
//! * event id / field value: printable ASCII, spaces allowed;
//! * identifier (session, build, bucket, group id, version): no spaces;
//! * field name: identifier rules plus `.` replaced, with canonical tokens
//!   exempt so already-substituted names survive re-escaping.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use crate::event::EventValue;
use crate::rules::is_canonical_token;

/// Characters replaced with `_` in the identifier context.
const SYMBOLS_TO_REPLACE: &str = ":;, ";
/// Characters replaced with `_` in the field-name context.
const SYMBOLS_TO_REPLACE_FIELD_NAME: &str = ".:;, ";

/// Escapes an event id or event data value. Only printable ASCII symbols
/// are kept; quotes are dropped, spaces are preserved.
pub fn escape_value(s: &str) -> String {
    escape_internal(s, None, true)
}

/// Escapes an identifier (session id, build, bucket, group id or version).
/// Like [`escape_value`] but space, `:`, `;` and `,` become `_`.
pub fn escape_identifier(s: &str) -> String {
    escape_internal(s, Some(SYMBOLS_TO_REPLACE), false)
}

/// Escapes a field name: identifier rules plus `.` replaced with `_`.
/// A string exactly equal to a canonical token is returned unmodified.
pub fn escape_field_name(s: &str) -> String {
    if is_canonical_token(s) {
        return s.to_string();
    }
    escape_internal(s, Some(SYMBOLS_TO_REPLACE_FIELD_NAME), false)
}

/// Removes symbols prohibited under the legacy (pre-relaxation) charset but
/// allowed today. Used for backward compatibility with rules created against
/// the older policy.
///
/// Returns `None` if the input contains no prohibited symbols, which is
/// distinct from "cleaned to an identical string".
pub fn cleanup_for_legacy_rules(s: &str) -> Option<String> {
    if contains_system_symbols(s, Some(SYMBOLS_TO_REPLACE)) {
        Some(replace(s, Some(SYMBOLS_TO_REPLACE), false))
    } else {
        None
    }
}

/// Escapes a whole event data map: field names through the field-name
/// context, values through the value context, recursively.
pub fn escape_event_data(data: &HashMap<String, EventValue>) -> HashMap<String, EventValue> {
    data.iter()
        .map(|(key, value)| (escape_field_name(key), escape_event_value(value)))
        .collect()
}

/// Escapes one event data value, recursing through lists and maps. Only
/// strings and map keys are rewritten; numbers and booleans pass through.
pub fn escape_event_value(value: &EventValue) -> EventValue {
    match value {
        EventValue::String(s) => EventValue::String(escape_value(s)),
        EventValue::List(items) => EventValue::List(items.iter().map(escape_event_value).collect()),
        EventValue::Map(entries) => EventValue::Map(escape_event_data(entries)),
        other => other.clone(),
    }
}

fn escape_internal(s: &str, to_replace: Option<&str>, allow_spaces: bool) -> String {
    if contains_system_symbols(s, to_replace) {
        replace(s, to_replace, allow_spaces)
    } else {
        s.to_string()
    }
}

fn replace(value: &str, to_replace: Option<&str>, allow_spaces: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if !c.is_ascii() {
            out.push('?');
        } else if is_whitespace_to_replace(c) {
            out.push(if allow_spaces { ' ' } else { '_' });
        } else if is_symbol_to_replace(c, to_replace) {
            out.push('_');
        } else if !is_prohibited_symbol(c) {
            out.push(c);
        }
    }
    out
}

fn contains_system_symbols(value: &str, to_replace: Option<&str>) -> bool {
    value.chars().any(|c| {
        !c.is_ascii()
            || is_whitespace_to_replace(c)
            || is_symbol_to_replace(c, to_replace)
            || is_prohibited_symbol(c)
    })
}

fn is_whitespace_to_replace(c: char) -> bool {
    c == '\n' || c == '\r' || c == '\t'
}

fn is_symbol_to_replace(c: char, to_replace: Option<&str>) -> bool {
    if to_replace.is_some_and(|set| set.contains(c)) {
        return true;
    }
    is_ascii_control(c)
}

fn is_ascii_control(c: char) -> bool {
    (c as u32) < 32 || c as u32 == 127
}

fn is_prohibited_symbol(c: char) -> bool {
    c == '\'' || c == '"'
}
