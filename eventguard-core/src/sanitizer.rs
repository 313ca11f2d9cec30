//! sanitizer.rs - Recursive sanitization of an event's data tree.
//!
//! Walks the payload applying the group's per-path rules, replacing failing
//! values and, for fields with no registered rule, failing field names with
//! canonical tokens. Output containers are always freshly allocated.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use crate::event::EventValue;
use crate::rules::group::GroupRuleSet;
use crate::rules::matcher::RuleScope;
use crate::rules::{
    is_canonical_token, EventContext, ValidationResult, UNDEFINED_RULE_TOKEN,
};

/// Sanitizer for one event against one group's rules, scoped to the
/// snapshot the rules came from.
pub struct PayloadSanitizer<'a> {
    group: &'a GroupRuleSet,
    scope: RuleScope<'a>,
    excluded_fields: &'a [String],
}

impl<'a> PayloadSanitizer<'a> {
    pub(crate) fn new(
        group: &'a GroupRuleSet,
        scope: RuleScope<'a>,
        excluded_fields: &'a [String],
    ) -> Self {
        Self { group, scope, excluded_fields }
    }

    /// Sanitizes the whole data tree of the event in `context`.
    pub fn sanitize(&self, context: &EventContext) -> HashMap<String, EventValue> {
        let mut sanitized = HashMap::with_capacity(context.event_data.len());
        for (name, value) in &context.event_data {
            let (name, value) = self.sanitize_field(name, name, value, context);
            sanitized.insert(name, value);
        }
        sanitized
    }

    /// Sanitizes one field, returning its outgoing name and value. `path` is
    /// the accumulated dot path used for rule and exclusion lookup; `name`
    /// is the immediate key the field is stored under.
    pub(crate) fn sanitize_field(
        &self,
        path: &str,
        name: &str,
        value: &EventValue,
        context: &EventContext,
    ) -> (String, EventValue) {
        // A canonical token is already sanitized and stays final.
        if let EventValue::String(text) = value {
            if is_canonical_token(text) {
                return (name.to_string(), value.clone());
            }
        }
        if self.is_excluded(path) {
            return (name.to_string(), value.clone());
        }
        match value {
            EventValue::Map(entries) => {
                let mut sanitized = HashMap::with_capacity(entries.len());
                let mut all_undefined = !entries.is_empty();
                for (entry_name, entry_value) in entries {
                    let entry_path = format!("{path}.{entry_name}");
                    let (entry_name, entry_value) =
                        self.sanitize_field(&entry_path, entry_name, entry_value, context);
                    all_undefined &= entry_name == UNDEFINED_RULE_TOKEN;
                    sanitized.insert(entry_name, entry_value);
                }
                (collapse_name(name, all_undefined), EventValue::Map(sanitized))
            }
            EventValue::List(items) => {
                let mut sanitized = Vec::with_capacity(items.len());
                let mut all_undefined = !items.is_empty();
                for item in items {
                    let (item_name, item_value) = self.sanitize_field(path, name, item, context);
                    all_undefined &= item_name == UNDEFINED_RULE_TOKEN;
                    sanitized.push(item_value);
                }
                (collapse_name(name, all_undefined), EventValue::List(sanitized))
            }
            scalar => {
                let Some(text) = scalar.as_match_text() else {
                    return undefined_field();
                };
                let result = self.group.validate_value(path, &text, context, &self.scope);
                if result == ValidationResult::UndefinedRule {
                    return undefined_field();
                }
                match result.token() {
                    None => (name.to_string(), scalar.clone()),
                    Some(token) => (name.to_string(), EventValue::from(token)),
                }
            }
        }
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.excluded_fields.iter().any(|field| field == path)
    }
}

/// A container whose entries all came back nameless-by-rule takes the
/// `undefined_rule` name itself.
fn collapse_name(name: &str, all_undefined: bool) -> String {
    if all_undefined {
        UNDEFINED_RULE_TOKEN.to_string()
    } else {
        name.to_string()
    }
}

fn undefined_field() -> (String, EventValue) {
    (UNDEFINED_RULE_TOKEN.to_string(), EventValue::from(UNDEFINED_RULE_TOKEN))
}
