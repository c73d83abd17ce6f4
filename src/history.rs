//! Edit history: a capped, append-only log with a cursor.
//!
//! The cursor is the only state: `None` is the pristine seeded state, and
//! `Some(i)` means entries `0..=i` are applied. Jumping recomputes the grade
//! store from the original sheet values and replays forward, so any index in
//! the retained range lands on the same state sequential undo/redo would.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persist::KeyValueStore;
use crate::store::GradeStore;
use crate::types::{CellScalar, HeaderMapping, Sheet};

/// Maximum retained entries; older entries are evicted from the front.
pub const HISTORY_CAP: usize = 50;

/// One recorded grade change. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EditEntry {
    pub student_id: String,
    pub column: String,
    pub old_value: CellScalar,
    pub new_value: CellScalar,
    pub timestamp: DateTime<Utc>,
    /// Display name captured at commit time, for history listings.
    pub student_name: String,
}

/// Serialized snapshot for the persistence port.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistorySnapshot {
    entries: Vec<EditEntry>,
    cursor: Option<usize>,
}

/// The edit log and its cursor.
#[derive(Debug, Default)]
pub struct EditHistory {
    entries: Vec<EditEntry>,
    cursor: Option<usize>,
}

impl EditHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[EditEntry] {
        &self.entries
    }

    /// Index of the last applied entry; `None` at the pristine state.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(0, |c| c + 1) < self.entries.len()
    }

    /// Record a committed edit.
    ///
    /// Entries beyond the cursor are discarded first (the standard
    /// new-edit-after-undo branch cut), then the entry is appended and the
    /// log is capped at [`HISTORY_CAP`] by evicting from the front.
    pub fn commit(&mut self, entry: EditEntry) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);

        if self.entries.len() > HISTORY_CAP {
            let overflow = self.entries.len() - HISTORY_CAP;
            self.entries.drain(..overflow);
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Revert the entry at the cursor. Returns false (an observable no-op)
    /// when there is nothing to undo.
    pub fn undo(&mut self, store: &mut GradeStore) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };
        let Some(entry) = self.entries.get(cursor) else {
            return false;
        };
        store.set(&entry.student_id, &entry.column, entry.old_value.clone());
        self.cursor = cursor.checked_sub(1);
        true
    }

    /// Re-apply the entry after the cursor. Returns false when there is
    /// nothing to redo.
    pub fn redo(&mut self, store: &mut GradeStore) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        let Some(entry) = self.entries.get(next) else {
            return false;
        };
        store.set(&entry.student_id, &entry.column, entry.new_value.clone());
        self.cursor = Some(next);
        true
    }

    /// Deterministically reconstruct the store at an arbitrary history point.
    ///
    /// The store is reseeded from the original sheet values, then entries
    /// `0..=index` are replayed in order. `None` jumps to the pristine
    /// seeded state. Returns false for an out-of-range index.
    pub fn jump_to(
        &mut self,
        index: Option<usize>,
        store: &mut GradeStore,
        sheet: &Sheet,
        mapping: &HeaderMapping,
    ) -> bool {
        if let Some(i) = index {
            if i >= self.entries.len() {
                return false;
            }
        }

        store.seed(sheet, mapping);
        if let Some(i) = index {
            for entry in self.entries.iter().take(i + 1) {
                store.set(&entry.student_id, &entry.column, entry.new_value.clone());
            }
        }
        self.cursor = index;
        true
    }

    /// Drop all entries and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Persist the log and cursor under `key`.
    pub fn save(&self, port: &mut dyn KeyValueStore, key: &str) {
        let snapshot = HistorySnapshot {
            entries: self.entries.clone(),
            cursor: self.cursor,
        };
        match serde_json::to_string(&snapshot) {
            Ok(json) => port.set(key, &json),
            Err(e) => log::warn!("history serialization failed: {e}"),
        }
    }

    /// Restore a persisted log; a corrupt payload yields an empty history.
    pub fn load(&mut self, port: &dyn KeyValueStore, key: &str) {
        let snapshot = port
            .get(key)
            .and_then(|payload| serde_json::from_str::<HistorySnapshot>(&payload).ok())
            .unwrap_or_default();
        self.entries = snapshot.entries;
        self.cursor = snapshot
            .cursor
            .filter(|&c| c < self.entries.len());
    }
}
