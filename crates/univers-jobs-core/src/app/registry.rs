//! PollRegistry - handle ごとに有効なポーリングは高々 1 つ
//!
//! # 不変条件
//! - 1 つの handle に対してエントリは最大 1 件
//! - 再登録時は古いエントリを返す（呼び出し側がキャンセルする）
//! - ポーリングタスクは自分の `PollId` のエントリしか削除できない

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::domain::{JobHandle, PollId};

/// One active polling registration.
#[derive(Debug, Clone)]
pub struct PollEntry {
    pub id: PollId,
    pub token: CancellationToken,
}

impl PollEntry {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            id: PollId::generate(),
            token,
        }
    }
}

/// Map of job handle to its active polling registration.
///
/// The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct PollRegistry {
    entries: Mutex<HashMap<JobHandle, PollEntry>>,
}

impl PollRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<JobHandle, PollEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `entry` for `handle` and return the entry it replaces.
    pub fn install(&self, handle: JobHandle, entry: PollEntry) -> Option<PollEntry> {
        self.entries().insert(handle, entry)
    }

    /// Remove the entry for `handle` whatever its generation.
    pub fn remove(&self, handle: &JobHandle) -> Option<PollEntry> {
        self.entries().remove(handle)
    }

    /// Remove the entry for `handle` only if it is still generation `id`.
    pub fn release(&self, handle: &JobHandle, id: PollId) -> bool {
        let mut entries = self.entries();
        match entries.get(handle) {
            Some(entry) if entry.id == id => {
                entries.remove(handle);
                true
            }
            _ => false,
        }
    }

    /// Take every entry, leaving the registry empty.
    pub fn drain(&self) -> Vec<(JobHandle, PollEntry)> {
        self.entries().drain().collect()
    }

    pub fn contains(&self, handle: &JobHandle) -> bool {
        self.entries().contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn handles(&self) -> Vec<JobHandle> {
        let mut handles: Vec<JobHandle> = self.entries().keys().cloned().collect();
        handles.sort();
        handles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PollEntry {
        PollEntry::new(CancellationToken::new())
    }

    #[test]
    fn install_returns_the_replaced_entry() {
        let registry = PollRegistry::new();
        let handle = JobHandle::new("abc");
        let first = entry();
        let first_id = first.id;

        assert!(registry.install(handle.clone(), first).is_none());
        let replaced = registry.install(handle.clone(), entry()).unwrap();

        assert_eq!(replaced.id, first_id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn stale_generation_cannot_release_newer_entry() {
        let registry = PollRegistry::new();
        let handle = JobHandle::new("abc");
        let old = entry();
        let old_id = old.id;
        registry.install(handle.clone(), old);
        let new = entry();
        let new_id = new.id;
        registry.install(handle.clone(), new);

        assert!(!registry.release(&handle, old_id));
        assert!(registry.contains(&handle));
        assert!(registry.release(&handle, new_id));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_missing_handle_is_noop() {
        let registry = PollRegistry::new();
        registry.install(JobHandle::new("a"), entry());

        assert!(registry.remove(&JobHandle::new("zzz")).is_none());
        assert_eq!(registry.handles(), vec![JobHandle::new("a")]);
    }

    #[test]
    fn drain_empties_registry() {
        let registry = PollRegistry::new();
        for name in ["a", "b", "c"] {
            registry.install(JobHandle::new(name), entry());
        }

        assert_eq!(registry.drain().len(), 3);
        assert!(registry.is_empty());
    }
}
