//! group.rs - Compiled rule set for one event group.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use crate::descriptor::GroupRulesDescriptor;
use crate::rules::compiler::RuleExpression;
use crate::rules::matcher::{evaluate_alternatives, RuleScope};
use crate::rules::{is_canonical_token, EventContext, ValidationResult};

/// All compiled rules of one group: event-id alternatives plus per-field
/// alternatives keyed by dot path. A group configured without a `rules`
/// object gets an empty set, which degrades every field to `undefined_rule`
/// instead of dropping the event.
#[derive(Debug, Default)]
pub struct GroupRuleSet {
    event_id_rules: Vec<RuleExpression>,
    event_data_rules: HashMap<String, Vec<RuleExpression>>,
}

impl GroupRuleSet {
    /// Compiles the group's rule strings. Unparsable rules degrade to
    /// always-INCORRECT_RULE expressions and are logged, never fatal.
    pub fn from_descriptor(descriptor: Option<&GroupRulesDescriptor>) -> Self {
        let Some(descriptor) = descriptor else {
            return Self::default();
        };
        Self {
            event_id_rules: compile_all(&descriptor.event_id),
            event_data_rules: descriptor
                .event_data
                .iter()
                .map(|(path, rules)| (path.clone(), compile_all(rules)))
                .collect(),
        }
    }

    /// Validates the event id. A canonical token is accepted as-is, because
    /// it marks a value that was already sanitized upstream.
    pub(crate) fn validate_event_id(
        &self,
        event_id: &str,
        context: &EventContext,
        scope: &RuleScope<'_>,
    ) -> ValidationResult {
        if is_canonical_token(event_id) {
            return ValidationResult::Accepted;
        }
        evaluate_alternatives(&self.event_id_rules, event_id, context, scope)
    }

    /// Validates one scalar value at the given dot path.
    pub(crate) fn validate_value(
        &self,
        path: &str,
        value: &str,
        context: &EventContext,
        scope: &RuleScope<'_>,
    ) -> ValidationResult {
        let rules = self.event_data_rules.get(path).map(Vec::as_slice).unwrap_or(&[]);
        evaluate_alternatives(rules, value, context, scope)
    }
}

fn compile_all(rules: &[String]) -> Vec<RuleExpression> {
    rules.iter().map(|rule| RuleExpression::compile_lossy(rule)).collect()
}
