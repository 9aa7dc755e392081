//! Persisted sync ledger for the course outline.
//!
//! This module provides:
//! - The ledger data model and its counting policy
//! - Durable key/value storage backends
//! - The progress indicator derived from the ledger
//!
//! Every mutation reads the full ledger from storage, changes it in memory
//! and writes it back. The ledger is only touched from the UI thread.

mod delta;
mod progress;
mod storage;

pub use delta::DeltaLedger;
#[cfg(test)]
pub use delta::{SectionEntry, SectionLevel};
pub use progress::ProgressIndicator;
pub use storage::{DurableStorage, FileStorage, MemoryStorage};

use crate::error::{Result, ResultExt};
use crate::outline::Category;
use log::{debug, info};

/// Storage key the ledger is serialized under.
pub const LEDGER_KEY: &str = "CourseDelta";

// ─────────────────────────────────────────────────────────────────────────────
// Ledger Store
// ─────────────────────────────────────────────────────────────────────────────

/// The ledger bound to its durable storage, plus the progress it drives.
pub struct LedgerStore {
    storage: Box<dyn DurableStorage>,
    progress: ProgressIndicator,
}

impl LedgerStore {
    /// Open the ledger at session start.
    ///
    /// A missing or unreadable ledger counts as empty.
    pub fn open(storage: Box<dyn DurableStorage>) -> Self {
        let mut store = Self {
            storage,
            progress: ProgressIndicator::default(),
        };
        let ledger = store
            .load()
            .unwrap_or_warn_default(DeltaLedger::new(), "Failed to read sync ledger");
        info!(
            "Sync ledger opened: {} pending change(s), {} section(s)",
            ledger.delta_count,
            ledger.sections.len()
        );
        store.progress = ProgressIndicator::from_ledger(&ledger);
        store
    }

    /// Read the current ledger from storage.
    pub fn load(&self) -> Result<DeltaLedger> {
        let stored = self.storage.get_item(LEDGER_KEY)?;
        parse_ledger(stored.as_deref())
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    /// Read, mutate, and write back if `mutate` reports a change.
    ///
    /// An unparsable stored value is replaced by the result of mutating an
    /// empty ledger. Storage read and write errors still propagate.
    fn transact<T>(&mut self, mutate: impl FnOnce(&mut DeltaLedger) -> (bool, T)) -> Result<T> {
        let stored = self.storage.get_item(LEDGER_KEY)?;
        let mut ledger = parse_ledger(stored.as_deref())
            .unwrap_or_warn_default(DeltaLedger::new(), "Discarding unreadable sync ledger");
        let (changed, value) = mutate(&mut ledger);
        if changed {
            let json = serde_json::to_string(&ledger)?;
            self.storage.set_item(LEDGER_KEY, &json)?;
            self.progress.update(&ledger);
            debug!(
                "Sync ledger saved: delta_count={}, sections={}",
                ledger.delta_count,
                ledger.sections.len()
            );
        }
        Ok(value)
    }

    #[cfg(test)]
    pub fn increment(&mut self, level: SectionLevel) -> Result<u64> {
        self.transact(|ledger| (true, ledger.increment(level)))
    }

    #[cfg(test)]
    pub fn decrement(&mut self, level: SectionLevel) -> Result<u64> {
        self.transact(|ledger| (true, ledger.decrement(level)))
    }

    /// Record a created or duplicated entry. Returns whether the ledger changed.
    pub fn record_child_added(
        &mut self,
        category: Category,
        name: &str,
        id: &str,
        parent_id: &str,
    ) -> Result<bool> {
        self.transact(|ledger| {
            let changed = ledger.record_child_added(category, name, id, parent_id);
            (changed, changed)
        })
    }

    /// Record a deleted entry. Returns whether the ledger changed.
    pub fn record_delete(
        &mut self,
        category: Category,
        entry_id: &str,
        parent_id: &str,
    ) -> Result<bool> {
        self.transact(|ledger| {
            let changed = ledger.record_delete(category, entry_id, parent_id);
            (changed, changed)
        })
    }
}

fn parse_ledger(stored: Option<&str>) -> Result<DeltaLedger> {
    match stored.map(str::trim) {
        Some(json) if !json.is_empty() && json != "null" => Ok(serde_json::from_str(json)?),
        _ => Ok(DeltaLedger::new()),
    }
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Memory storage the test can inspect after handing it to the store.
    #[derive(Clone, Default)]
    struct SharedStorage(Rc<RefCell<MemoryStorage>>);

    impl DurableStorage for SharedStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            self.0.borrow().get_item(key)
        }
        fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
            self.0.borrow_mut().set_item(key, value)
        }
    }

    struct BrokenStorage;

    impl DurableStorage for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Ok(Some("{ broken".to_string()))
        }
        fn set_item(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Application("read only".to_string()))
        }
    }

    fn stored(storage: &SharedStorage) -> DeltaLedger {
        let json = storage.get_item(LEDGER_KEY).unwrap().unwrap();
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_absent_ledger_is_empty() {
        let store = LedgerStore::open(Box::new(MemoryStorage::new()));
        assert_eq!(store.load().unwrap(), DeltaLedger::new());
        assert!(store.progress().all_caught_up);
    }

    #[test]
    fn test_add_then_delete_section_roundtrip() {
        let storage = SharedStorage::default();
        let mut store = LedgerStore::open(Box::new(storage.clone()));

        assert!(store
            .record_child_added(Category::Chapter, "Week 1", "c1", "course")
            .unwrap());
        assert_eq!(
            stored(&storage),
            DeltaLedger {
                delta_count: 1,
                sections: vec![SectionEntry::modified("c1", "Week 1")],
            }
        );
        assert!(!store.progress().all_caught_up);
        assert_eq!(store.progress().count_label(), "1");

        assert!(store.record_delete(Category::Chapter, "c1", "course").unwrap());
        assert_eq!(stored(&storage), DeltaLedger::new());
        assert!(store.progress().all_caught_up);
    }

    #[test]
    fn test_unchanged_ledger_is_not_written() {
        let storage = SharedStorage::default();
        let mut store = LedgerStore::open(Box::new(storage.clone()));
        assert!(!store
            .record_child_added(Category::Vertical, "Unit", "u1", "s1")
            .unwrap());
        assert_eq!(storage.get_item(LEDGER_KEY).unwrap(), None);
    }

    #[test]
    fn test_ledger_survives_reopen() {
        let storage = SharedStorage::default();
        {
            let mut store = LedgerStore::open(Box::new(storage.clone()));
            store.increment(SectionLevel::Section).unwrap();
            store.increment(SectionLevel::Subsection).unwrap();
            store.decrement(SectionLevel::Section).unwrap();
        }
        let reopened = LedgerStore::open(Box::new(storage));
        assert_eq!(reopened.progress().delta_count, 1);
    }

    #[test]
    fn test_broken_storage_reports_errors() {
        let mut store = LedgerStore::open(Box::new(BrokenStorage));
        assert!(store.progress().all_caught_up);
        assert!(store
            .record_child_added(Category::Chapter, "Week 1", "c1", "course")
            .is_err());
    }

    #[test]
    fn test_corrupt_ledger_is_rebaselined_on_next_change() {
        let storage = MemoryStorage::new().with_item(LEDGER_KEY, "{ broken");
        let mut store = LedgerStore::open(Box::new(storage));
        assert!(store.progress().all_caught_up);
        assert!(store.load().is_err());

        let changed = store
            .record_child_added(Category::Chapter, "Week 1", "c1", "course")
            .unwrap();
        assert!(changed);
        assert_eq!(store.progress().delta_count, 1);
        assert!(!store.progress().all_caught_up);

        let ledger = store.load().unwrap();
        assert_eq!(ledger.delta_count, 1);
        assert_eq!(ledger.sections, vec![SectionEntry::modified("c1", "Week 1")]);
    }

    #[test]
    fn test_reads_existing_wire_format() {
        let storage = MemoryStorage::new().with_item(
            LEDGER_KEY,
            r#"{"delta_count":"1","section":[{"id":"c1","name":"Week 1","modified_or_not_exist":true},{"id":"c2","name":"Week 2","modified_or_not_exist":false},{"id":"c3","name":"Week 3","modified_or_not_exist":false},{"id":"c4","name":"Week 4","modified_or_not_exist":false}]}"#,
        );
        let store = LedgerStore::open(Box::new(storage));
        assert_eq!(store.progress().percent, Some(75.0));
        assert_eq!(store.progress().delta_count, 1);
    }
}
