//! storage.rs - Immutable policy snapshots and the storage seam the
//! validator reads them through.
//!
//! A snapshot bundles everything compiled from one descriptor document. It
//! is never mutated; updates build a new snapshot and swap the reference
//! under a lock held only for the swap, so validation calls running against
//! the previous snapshot are undisturbed.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use log::debug;

use crate::descriptor::{DescriptorDocument, GroupDescriptor};
use crate::filter::GroupFilter;
use crate::rules::group::GroupRuleSet;
use crate::rules::registry::GlobalRuleRegistry;
use crate::rules::{NoUtilRules, UtilRuleProvider};

/// Compiled policy for one group: its rules plus its applicability filter.
pub struct GroupPolicy {
    pub rules: GroupRuleSet,
    pub filter: GroupFilter,
}

impl GroupPolicy {
    fn from_descriptor(descriptor: &GroupDescriptor) -> Self {
        Self {
            rules: GroupRuleSet::from_descriptor(descriptor.rules.as_ref()),
            filter: GroupFilter::new(&descriptor.builds, &descriptor.versions),
        }
    }
}

/// Everything one validation call needs, compiled from one descriptor
/// document. Immutable once built.
pub struct Snapshot {
    registry: GlobalRuleRegistry,
    groups: HashMap<String, GroupPolicy>,
    utils: Arc<dyn UtilRuleProvider>,
    excluded_fields: Vec<String>,
}

impl Snapshot {
    /// Compiles a descriptor document. Broken rules inside the document
    /// degrade individually; only an unparsable document itself is a fatal
    /// input error, and that is the caller's concern before this point.
    pub fn build(
        document: &DescriptorDocument,
        utils: Arc<dyn UtilRuleProvider>,
        excluded_fields: Vec<String>,
    ) -> Self {
        let registry = GlobalRuleRegistry::build(&document.rules);
        let groups = document
            .groups
            .iter()
            .map(|group| (group.id.clone(), GroupPolicy::from_descriptor(group)))
            .collect::<HashMap<_, _>>();
        debug!("Built policy snapshot: {} groups, {} global rules.", groups.len(), registry.len());
        Self { registry, groups, utils, excluded_fields }
    }

    /// An empty snapshot that knows no groups; every event is dropped as
    /// not applicable.
    pub fn empty() -> Self {
        Self {
            registry: GlobalRuleRegistry::default(),
            groups: HashMap::new(),
            utils: Arc::new(NoUtilRules),
            excluded_fields: Vec::new(),
        }
    }

    pub fn policy(&self, group_id: &str) -> Option<&GroupPolicy> {
        self.groups.get(group_id)
    }

    pub fn registry(&self) -> &GlobalRuleRegistry {
        &self.registry
    }

    pub fn utils(&self) -> &dyn UtilRuleProvider {
        self.utils.as_ref()
    }

    pub fn excluded_fields(&self) -> &[String] {
        &self.excluded_fields
    }
}

/// Read seam between the validator and whoever owns the policy lifecycle.
pub trait RuleStorage: Send + Sync {
    /// The current snapshot. Callers hold the returned `Arc` for the whole
    /// validation call; a concurrent replace must not affect them.
    fn snapshot(&self) -> Arc<Snapshot>;

    /// True when policy metadata could not be loaded at all. Validation
    /// then degrades to UNREACHABLE_METADATA tokens instead of evaluating
    /// rules.
    fn is_unreachable(&self) -> bool {
        false
    }
}

/// In-memory storage with atomic wholesale replacement.
pub struct SimpleRuleStorage {
    current: RwLock<Arc<Snapshot>>,
    utils: Arc<dyn UtilRuleProvider>,
    excluded_fields: Vec<String>,
}

impl SimpleRuleStorage {
    pub fn new(document: &DescriptorDocument) -> Self {
        Self::with_options(document, Arc::new(NoUtilRules), Vec::new())
    }

    pub fn with_options(
        document: &DescriptorDocument,
        utils: Arc<dyn UtilRuleProvider>,
        excluded_fields: Vec<String>,
    ) -> Self {
        let snapshot = Snapshot::build(document, Arc::clone(&utils), excluded_fields.clone());
        Self { current: RwLock::new(Arc::new(snapshot)), utils, excluded_fields }
    }

    /// Replaces the current snapshot with one built from `document`. The
    /// new snapshot is compiled outside the lock; the write lock is held
    /// only for the pointer swap.
    pub fn replace(&self, document: &DescriptorDocument) {
        let snapshot =
            Arc::new(Snapshot::build(document, Arc::clone(&self.utils), self.excluded_fields.clone()));
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = snapshot;
    }
}

impl RuleStorage for SimpleRuleStorage {
    fn snapshot(&self) -> Arc<Snapshot> {
        let current = self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&current)
    }
}

/// Degraded storage for the "metadata could not be loaded" operating mode.
pub struct UnreachableStorage {
    empty: Arc<Snapshot>,
}

impl UnreachableStorage {
    pub fn new() -> Self {
        Self { empty: Arc::new(Snapshot::empty()) }
    }
}

impl Default for UnreachableStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStorage for UnreachableStorage {
    fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.empty)
    }

    fn is_unreachable(&self) -> bool {
        true
    }
}
