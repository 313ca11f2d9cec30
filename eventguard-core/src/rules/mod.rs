//! Validation rule primitives: the result type with its canonical wire
//! tokens, the event context handed to rules, and the injected util-rule
//! capability.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;
use std::sync::Arc;

use crate::event::EventValue;

pub mod compiler;
pub mod group;
pub mod matcher;
pub mod registry;

/// Outcome of validating a single value or field against group rules.
///
/// Every variant except [`ValidationResult::Accepted`] carries a fixed
/// canonical token that replaces the failing value on the wire. The tokens
/// are a wire contract and must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// Value is checked and recorded as is.
    Accepted,
    /// Unexpected value, e.g. a free-form string no rule accepts.
    Rejected,
    /// No rule is registered for the field at all.
    UndefinedRule,
    /// The rule itself is broken: unparsable, unresolved global reference or
    /// unknown util name.
    IncorrectRule,
    /// Value is well-formed but belongs to an unknown third party.
    ThirdParty,
    /// Policy metadata could not be loaded; validation is degraded.
    UnreachableMetadata,
}

pub const REJECTED_TOKEN: &str = "rejected";
pub const UNDEFINED_RULE_TOKEN: &str = "undefined_rule";
pub const INCORRECT_RULE_TOKEN: &str = "incorrect_rule";
pub const THIRD_PARTY_TOKEN: &str = "third_party";
pub const UNREACHABLE_METADATA_TOKEN: &str = "unreachable_metadata";

/// All canonical tokens, i.e. every reserved string a failing value or field
/// name can be replaced with.
pub const CANONICAL_TOKENS: &[&str] = &[
    REJECTED_TOKEN,
    UNDEFINED_RULE_TOKEN,
    INCORRECT_RULE_TOKEN,
    THIRD_PARTY_TOKEN,
    UNREACHABLE_METADATA_TOKEN,
];

impl ValidationResult {
    /// The canonical wire token for this result, or `None` for `Accepted`
    /// (an accepted value is kept verbatim and emits no token).
    pub const fn token(&self) -> Option<&'static str> {
        match self {
            ValidationResult::Accepted => None,
            ValidationResult::Rejected => Some(REJECTED_TOKEN),
            ValidationResult::UndefinedRule => Some(UNDEFINED_RULE_TOKEN),
            ValidationResult::IncorrectRule => Some(INCORRECT_RULE_TOKEN),
            ValidationResult::ThirdParty => Some(THIRD_PARTY_TOKEN),
            ValidationResult::UnreachableMetadata => Some(UNREACHABLE_METADATA_TOKEN),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted)
    }

    /// Priority when several alternatives all fail:
    /// THIRD_PARTY > INCORRECT_RULE > everything else.
    pub(crate) fn negative_priority(&self) -> u8 {
        match self {
            ValidationResult::ThirdParty => 3,
            ValidationResult::IncorrectRule => 2,
            _ => 1,
        }
    }
}

/// Returns true if `value` is one of the canonical tokens. Such values are
/// treated as already validated and never re-evaluated.
pub fn is_canonical_token(value: &str) -> bool {
    CANONICAL_TOKENS.contains(&value)
}

/// Whole-event context available to rules while validating a single value.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub event_id: String,
    pub event_data: HashMap<String, EventValue>,
}

impl EventContext {
    pub fn new(event_id: impl Into<String>, event_data: HashMap<String, EventValue>) -> Self {
        Self { event_id: event_id.into(), event_data }
    }
}

/// Verdict of an embedder-supplied util matcher. Deliberately narrower than
/// [`ValidationResult`]: a util rule can accept, reject or attribute the
/// value to a third party, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilMatch {
    Accepted,
    Rejected,
    ThirdParty,
}

impl From<UtilMatch> for ValidationResult {
    fn from(m: UtilMatch) -> Self {
        match m {
            UtilMatch::Accepted => ValidationResult::Accepted,
            UtilMatch::Rejected => ValidationResult::Rejected,
            UtilMatch::ThirdParty => ValidationResult::ThirdParty,
        }
    }
}

/// A pluggable matcher referenced from rule strings as `{util#name}`.
pub trait UtilRule: Send + Sync {
    fn matches(&self, value: &str, context: &EventContext) -> UtilMatch;
}

/// Capability injected by the embedder that maps util-rule names to
/// matchers. An unrecognized name yields [`ValidationResult::IncorrectRule`]
/// at the reference site, which is distinct from a recognized-but-failing
/// match.
pub trait UtilRuleProvider: Send + Sync {
    fn resolve(&self, name: &str) -> Option<Arc<dyn UtilRule>>;
}

/// Default provider that recognizes no util-rule names.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUtilRules;

impl UtilRuleProvider for NoUtilRules {
    fn resolve(&self, _name: &str) -> Option<Arc<dyn UtilRule>> {
        None
    }
}
