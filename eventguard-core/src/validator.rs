//! validator.rs - End-to-end event validation against the current policy
//! snapshot.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use crate::event::{Event, EventValue};
use crate::rules::matcher::RuleScope;
use crate::sanitizer::PayloadSanitizer;
use crate::storage::RuleStorage;
use crate::rules::{EventContext, ValidationResult, UNREACHABLE_METADATA_TOKEN};

/// Infrastructure event ids that bypass event-id validation. Their payload
/// is still sanitized like any other event's.
pub const SYSTEM_EVENT_IDS: &[&str] =
    &["metadata.loaded", "metadata.updated", "metadata.load.failed", "logs.send"];

/// Validates events against the rules served by its storage. Stateless
/// apart from the storage reference; calls may run in parallel.
pub struct EventValidator<S: RuleStorage> {
    storage: S,
}

impl<S: RuleStorage> EventValidator<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Validates one event.
    ///
    /// Returns `None` when the event's group is unknown or its rules do not
    /// apply to this build/version, which drops the event. Otherwise returns
    /// a fresh event whose id and data carry canonical tokens in place of
    /// everything that failed validation.
    pub fn validate_event(&self, event: &Event) -> Option<Event> {
        let snapshot = self.storage.snapshot();

        if self.storage.is_unreachable() {
            // Degraded mode: no usable policy, so no rule evaluation. The
            // id and every top-level field degrade to the unreachable token.
            let mut data = HashMap::new();
            if !event.data.is_empty() {
                data.insert(
                    UNREACHABLE_METADATA_TOKEN.to_string(),
                    EventValue::from(UNREACHABLE_METADATA_TOKEN),
                );
            }
            return Some(self.rebuild(event, UNREACHABLE_METADATA_TOKEN, &data));
        }

        let policy = snapshot.policy(&event.group_id)?;
        if !policy.filter.accepts(&event.group_version, &event.build) {
            return None;
        }

        let context = EventContext::new(event.event_id.clone(), event.data.clone());
        let event_id = if SYSTEM_EVENT_IDS.contains(&event.event_id.as_str()) {
            event.event_id.clone()
        } else {
            let scope = RuleScope { registry: snapshot.registry(), utils: snapshot.utils() };
            let result = policy.rules.validate_event_id(&event.event_id, &context, &scope);
            match result.token() {
                None => event.event_id.clone(),
                Some(token) => token.to_string(),
            }
        };

        let scope = RuleScope { registry: snapshot.registry(), utils: snapshot.utils() };
        let sanitizer = PayloadSanitizer::new(&policy.rules, scope, snapshot.excluded_fields());
        let data = sanitizer.sanitize(&context);

        Some(self.rebuild(event, &event_id, &data))
    }

    /// Ad hoc single-field check outside any event, e.g. before a value is
    /// even recorded.
    pub fn validate_field(&self, group_id: &str, path: &str, value: &str) -> ValidationResult {
        if self.storage.is_unreachable() {
            return ValidationResult::UnreachableMetadata;
        }
        let snapshot = self.storage.snapshot();
        let Some(policy) = snapshot.policy(group_id) else {
            return ValidationResult::UndefinedRule;
        };
        let scope = RuleScope { registry: snapshot.registry(), utils: snapshot.utils() };
        let context = EventContext::default();
        policy.rules.validate_value(path, value, &context, &scope)
    }

    /// Rebuilds the outgoing event through the escaping constructor so all
    /// envelope fields leave in escaped form.
    fn rebuild(&self, event: &Event, event_id: &str, data: &HashMap<String, EventValue>) -> Event {
        Event::new(
            &event.session,
            &event.build,
            &event.bucket,
            event.time,
            &event.group_id,
            &event.group_version,
            &event.recorder_version,
            event_id,
            event.state,
            data,
            event.count,
        )
    }
}
