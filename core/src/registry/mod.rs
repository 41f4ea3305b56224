//! Elite registry
//!
//! The single owner of every `EliteRecord`. Keyed by actor handle, so a stale
//! handle can never alias a new actor that reused the same slot.

mod record;

pub use record::{AffixTimers, BaselineStats, EliteRecord};

use hashbrown::HashMap;

use crate::host::ActorHandle;

#[derive(Debug, Default)]
pub struct EliteRegistry {
    records: HashMap<ActorHandle, EliteRecord>,
}

impl EliteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `actor`. Returns the record it replaced, if any.
    pub fn insert(&mut self, actor: ActorHandle, record: EliteRecord) -> Option<EliteRecord> {
        self.records.insert(actor, record)
    }

    pub fn remove(&mut self, actor: ActorHandle) -> Option<EliteRecord> {
        self.records.remove(&actor)
    }

    pub fn get(&self, actor: ActorHandle) -> Option<&EliteRecord> {
        self.records.get(&actor)
    }

    pub fn get_mut(&mut self, actor: ActorHandle) -> Option<&mut EliteRecord> {
        self.records.get_mut(&actor)
    }

    pub fn contains(&self, actor: ActorHandle) -> bool {
        self.records.contains_key(&actor)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of tracked handles, sorted, safe to iterate while removing
    pub fn handles(&self) -> Vec<ActorHandle> {
        let mut handles: Vec<_> = self.records.keys().copied().collect();
        handles.sort_unstable();
        handles
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorHandle, &EliteRecord)> {
        self.records.iter().map(|(h, r)| (*h, r))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorHandle, &mut EliteRecord)> {
        self.records.iter_mut().map(|(h, r)| (*h, r))
    }

    /// Drop every record whose actor fails `is_live`. Returns how many went.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(ActorHandle) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|h, _| is_live(*h));
        before - self.records.len()
    }
}
