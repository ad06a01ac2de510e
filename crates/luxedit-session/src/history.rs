//! Undo/redo history of edit snapshots.
//!
//! A snapshot is an owned deep copy of everything the user edits: the
//! settings map, the layer stack (including mask bitmaps) and the crop.
//! Restoring one never aliases live state.

use std::time::{Duration, Instant};

use luxedit_core::{CropBox, LayerManager, Settings};

/// Everything undo/redo restores.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSnapshot {
    pub settings: Settings,
    pub layers: LayerManager,
    pub crop: CropBox,
    pub crop_ratio: Option<f64>,
}

/// Linear history with a cursor on the current snapshot.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<EditSnapshot>,
    cursor: Option<usize>,
    limit: usize,
    debounce: Duration,
    last_navigation: Option<Instant>,
}

impl History {
    pub fn new(limit: usize, debounce: Duration) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            limit: limit.max(1),
            debounce,
            last_navigation: None,
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Index of the current snapshot.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&EditSnapshot> {
        self.cursor.and_then(|i| self.snapshots.get(i))
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|i| i + 1 < self.snapshots.len())
    }

    /// Record a snapshot after the cursor, dropping any redo branch.
    ///
    /// Returns false when the save was skipped: the snapshot equals the
    /// current one, or `debounced` is set and an undo/redo happened within
    /// the debounce window.
    pub fn save(&mut self, snapshot: EditSnapshot, debounced: bool) -> bool {
        self.save_at(snapshot, debounced, Instant::now())
    }

    pub(crate) fn save_at(&mut self, snapshot: EditSnapshot, debounced: bool, now: Instant) -> bool {
        if debounced {
            if let Some(last) = self.last_navigation {
                if now.saturating_duration_since(last) < self.debounce {
                    tracing::trace!("history save skipped inside debounce window");
                    return false;
                }
            }
        }

        if self.current() == Some(&snapshot) {
            return false;
        }

        if let Some(cursor) = self.cursor {
            self.snapshots.truncate(cursor + 1);
        }
        if self.snapshots.len() == self.limit {
            self.snapshots.remove(0);
        }
        self.snapshots.push(snapshot);
        self.cursor = Some(self.snapshots.len() - 1);

        tracing::debug!(
            position = self.snapshots.len() - 1,
            total = self.snapshots.len(),
            "saved history snapshot"
        );
        true
    }

    /// Step back. Returns the snapshot to restore.
    pub fn undo(&mut self) -> Option<&EditSnapshot> {
        self.undo_at(Instant::now())
    }

    pub(crate) fn undo_at(&mut self, now: Instant) -> Option<&EditSnapshot> {
        let cursor = self.cursor.filter(|&i| i > 0)? - 1;
        self.cursor = Some(cursor);
        self.last_navigation = Some(now);
        tracing::debug!(cursor, total = self.snapshots.len(), "undo");
        self.snapshots.get(cursor)
    }

    /// Step forward. Returns the snapshot to restore.
    pub fn redo(&mut self) -> Option<&EditSnapshot> {
        self.redo_at(Instant::now())
    }

    pub(crate) fn redo_at(&mut self, now: Instant) -> Option<&EditSnapshot> {
        let cursor = self.cursor.filter(|&i| i + 1 < self.snapshots.len())? + 1;
        self.cursor = Some(cursor);
        self.last_navigation = Some(now);
        tracing::debug!(cursor, total = self.snapshots.len(), "redo");
        self.snapshots.get(cursor)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
        self.last_navigation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxedit_core::settings::keys;

    fn snapshot(exposure: f32) -> EditSnapshot {
        let mut settings = Settings::default_image();
        settings.set_float(keys::EXPOSURE, exposure);
        EditSnapshot {
            settings,
            layers: LayerManager::new(),
            crop: CropBox::full(100.0, 100.0),
            crop_ratio: None,
        }
    }

    fn exposure(snapshot: Option<&EditSnapshot>) -> f32 {
        snapshot.map(|s| s.settings.float(keys::EXPOSURE)).unwrap_or(f32::NAN)
    }

    fn history() -> History {
        History::new(100, Duration::from_millis(500))
    }

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let mut history = history();
        for e in [0.0, 1.0, 2.0] {
            assert!(history.save(snapshot(e), false));
        }
        assert_eq!(exposure(history.undo()), 1.0);
        assert_eq!(exposure(history.undo()), 0.0);
        assert!(history.undo().is_none(), "Nothing before the first snapshot");
        assert_eq!(exposure(history.redo()), 1.0);
        assert_eq!(exposure(history.redo()), 2.0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_duplicate_of_current_is_skipped() {
        let mut history = history();
        assert!(history.save(snapshot(1.0), false));
        assert!(!history.save(snapshot(1.0), false), "Identical snapshot must not be stored");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_save_truncates_redo_branch() {
        let mut history = history();
        for e in [0.0, 1.0, 2.0] {
            history.save(snapshot(e), false);
        }
        history.undo();
        history.undo();
        history.save(snapshot(5.0), false);
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(exposure(history.undo()), 0.0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = History::new(3, Duration::ZERO);
        for e in 0..5 {
            history.save(snapshot(e as f32), false);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        history.undo();
        assert_eq!(exposure(history.undo()), 2.0, "Oldest kept snapshot is the third saved");
    }

    #[test]
    fn test_debounced_save_after_undo() {
        let mut history = history();
        let start = Instant::now();
        history.save_at(snapshot(0.0), false, start);
        history.save_at(snapshot(1.0), false, start);
        history.undo_at(start);

        let soon = start + Duration::from_millis(100);
        assert!(!history.save_at(snapshot(3.0), true, soon), "Debounced save inside the window is dropped");
        assert!(history.can_redo(), "Dropped save leaves the redo branch intact");

        assert!(history.save_at(snapshot(3.0), false, soon), "Undebounced saves always go through");

        let later = start + Duration::from_millis(600);
        assert!(history.save_at(snapshot(4.0), true, later));
    }

    #[test]
    fn test_snapshot_is_a_deep_copy() {
        let mut history = history();
        let mut live = snapshot(1.0);
        history.save(live.clone(), false);
        live.settings.set_float(keys::EXPOSURE, 9.0);
        assert_eq!(exposure(history.current()), 1.0, "Mutating live state must not touch history");
    }

    #[test]
    fn test_clear() {
        let mut history = history();
        history.save(snapshot(0.0), false);
        history.clear();
        assert!(history.is_empty());
        assert!(history.current().is_none());
        assert!(!history.can_undo());
    }
}
