//! event.rs - The telemetry event envelope and its recursive payload value.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::escaper;

/// One value inside an event's data tree.
///
/// The payload is a closed recursive variant: scalars, lists of values and
/// string-keyed maps of values. There is no open "any" case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventValue {
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<EventValue>),
    Map(HashMap<String, EventValue>),
}

impl EventValue {
    /// Textual form used when matching a scalar against rules. Containers
    /// are never matched directly, so they have no textual form.
    pub(crate) fn as_match_text(&self) -> Option<String> {
        match self {
            EventValue::Bool(b) => Some(b.to_string()),
            EventValue::Number(n) => Some(n.to_string()),
            EventValue::String(s) => Some(s.clone()),
            EventValue::List(_) | EventValue::Map(_) => None,
        }
    }
}

impl From<&str> for EventValue {
    fn from(s: &str) -> Self {
        EventValue::String(s.to_string())
    }
}

impl From<String> for EventValue {
    fn from(s: String) -> Self {
        EventValue::String(s)
    }
}

impl From<bool> for EventValue {
    fn from(b: bool) -> Self {
        EventValue::Bool(b)
    }
}

impl From<i64> for EventValue {
    fn from(n: i64) -> Self {
        EventValue::Number(Number::from(n))
    }
}

impl From<Vec<EventValue>> for EventValue {
    fn from(items: Vec<EventValue>) -> Self {
        EventValue::List(items)
    }
}

impl From<HashMap<String, EventValue>> for EventValue {
    fn from(entries: HashMap<String, EventValue>) -> Self {
        EventValue::Map(entries)
    }
}

/// A structured telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session: String,
    pub build: String,
    pub bucket: String,
    pub time: i64,
    pub group_id: String,
    pub group_version: String,
    pub recorder_version: String,
    pub event_id: String,
    #[serde(default)]
    pub state: bool,
    #[serde(default)]
    pub data: HashMap<String, EventValue>,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl Event {
    /// Creates an event with every field escaped for its context: envelope
    /// identifiers through the strict identifier charset, the event id and
    /// data values through the value charset, field names through the
    /// field-name charset.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session: &str,
        build: &str,
        bucket: &str,
        time: i64,
        group_id: &str,
        group_version: &str,
        recorder_version: &str,
        event_id: &str,
        state: bool,
        data: &HashMap<String, EventValue>,
        count: u32,
    ) -> Self {
        Self {
            session: escaper::escape_identifier(session),
            build: escaper::escape_identifier(build),
            bucket: escaper::escape_identifier(bucket),
            time,
            group_id: escaper::escape_identifier(group_id),
            group_version: escaper::escape_identifier(group_version),
            recorder_version: escaper::escape_identifier(recorder_version),
            event_id: escaper::escape_value(event_id),
            state,
            data: escaper::escape_event_data(data),
            count,
        }
    }
}
