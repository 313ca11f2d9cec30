// eventguard-core/src/lib.rs
//! # EventGuard Core Library
//!
//! `eventguard-core` sanitizes structured telemetry events before they leave
//! a product, ensuring no value violates a remotely-configured policy. It
//! compiles a small rule DSL into matchers, walks arbitrarily nested event
//! payloads applying per-field rules, filters groups by build/version
//! applicability, escapes strings into constrained charsets and anonymizes
//! identifying values with a salted one-way hash.
//!
//! The library is pure and synchronous: it performs no I/O, fetches nothing,
//! and persists nothing. Fetching the rule descriptor document and shipping
//! sanitized events are the embedder's concerns.
//!
//! ## Modules
//!
//! * `descriptor`: typed form of the remote rule descriptor document.
//! * `rules`: validation results, canonical tokens, the rule DSL compiler
//!   and matcher, global rule fragments and per-group rule sets.
//! * `filter`: build/version applicability windows.
//! * `sanitizer`: recursive payload sanitization.
//! * `storage`: immutable policy snapshots with atomic replacement.
//! * `validator`: the end-to-end event validation entry point.
//! * `escaper`: constrained-charset string escaping.
//! * `anonymizer`: salted one-way hashing of identifying values.
//! * `event`: the event envelope and its recursive payload value.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use eventguard_core::{
//!     DescriptorDocument, Event, EventValidator, EventValue, SimpleRuleStorage,
//! };
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let document = DescriptorDocument::from_json(
//!         r#"{
//!           "groups": [{
//!             "id": "editor.actions",
//!             "versions": [{"from": "1"}],
//!             "rules": {
//!               "event_id": ["{enum:opened|closed}"],
//!               "event_data": {"count": ["{regexp:\\d+}"]}
//!             }
//!           }]
//!         }"#,
//!     )?;
//!     let validator = EventValidator::new(SimpleRuleStorage::new(&document));
//!
//!     let mut data = HashMap::new();
//!     data.insert("count".to_string(), EventValue::from(42));
//!     let event = Event::new(
//!         "session", "203.6682.168", "123", 1_654_000_000, "editor.actions", "3", "1",
//!         "opened", false, &data, 1,
//!     );
//!
//!     let sanitized = validator.validate_event(&event).expect("group is applicable");
//!     assert_eq!(sanitized.event_id, "opened");
//!     assert_eq!(sanitized.data["count"], EventValue::from(42));
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Malformed event data never raises an error across the validation
//! boundary; every unvalidatable field degrades to a fixed canonical token.
//! Only construction-time failures (an unparsable descriptor document)
//! surface as [`ValidatorError`].
//!
//! ---
//! License: MIT OR APACHE 2.0

pub mod anonymizer;
pub mod descriptor;
pub mod errors;
pub mod escaper;
pub mod event;
pub mod filter;
pub mod rules;
pub mod sanitizer;
pub mod storage;
pub mod validator;

/// Re-exports the custom error type for clear error reporting.
pub use errors::ValidatorError;

/// Re-exports the descriptor document types consumed from the remote policy.
pub use descriptor::{DescriptorDocument, GroupDescriptor, GroupRulesDescriptor, RangeDescriptor};

/// Re-exports the event envelope and its recursive payload value.
pub use event::{Event, EventValue};

/// Re-exports validation results, canonical tokens and the util-rule
/// capability traits.
pub use rules::{
    is_canonical_token, EventContext, NoUtilRules, UtilMatch, UtilRule, UtilRuleProvider,
    ValidationResult, CANONICAL_TOKENS, INCORRECT_RULE_TOKEN, REJECTED_TOKEN, THIRD_PARTY_TOKEN,
    UNDEFINED_RULE_TOKEN, UNREACHABLE_METADATA_TOKEN,
};

/// Re-exports the compiled rule forms for embedders that inspect rules.
pub use rules::compiler::{RuleExpression, RulePart};
pub use rules::group::GroupRuleSet;
pub use rules::registry::GlobalRuleRegistry;

/// Re-exports the build/version applicability types.
pub use filter::{BuildNumber, BuildRange, GroupFilter, VersionRange};

/// Re-exports the payload sanitizer.
pub use sanitizer::PayloadSanitizer;

/// Re-exports snapshot storage: the immutable policy bundle, the storage
/// seam the validator reads through and the bundled implementations.
pub use storage::{GroupPolicy, RuleStorage, SimpleRuleStorage, Snapshot, UnreachableStorage};

/// Re-exports the end-to-end validator.
pub use validator::{EventValidator, SYSTEM_EVENT_IDS};

/// Re-exports the salted anonymizer.
pub use anonymizer::Anonymizer;
