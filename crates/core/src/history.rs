//! Bounded undo/redo action log
//!
//! A pure log, never a mutator: entries record what happened to annotations
//! and pins, and `undo`/`redo` hand the recorded action back so the caller
//! can apply the inverse (or replay the original) against the stores. Two
//! deques hold applied actions (`past`, most-recent last) and undone actions
//! (`future`, next-to-redo first), capped at [`MAX_HISTORY_SIZE`] with silent
//! oldest-entry eviction.

use crate::annotation::Annotation;
use crate::pin::Pin;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

/// Maximum number of retained history entries across both stacks
pub const MAX_HISTORY_SIZE: usize = 50;

/// The entity a history action applies to
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryTarget {
    Annotation(Annotation),
    Pin(Pin),
}

impl HistoryTarget {
    /// Human-readable label for the entity, falling back to the raw kind
    /// string for types introduced after this core shipped
    pub fn label(&self) -> String {
        match self {
            HistoryTarget::Annotation(a) => a.kind.label().to_string(),
            HistoryTarget::Pin(p) => format!("{} pin", p.kind),
        }
    }
}

/// A recorded edit
///
/// On undo the caller applies the inverse: delete the `Create` entity,
/// reinsert the `Delete` entity, apply an `Update`'s `before`. On redo the
/// original action is reapplied.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryAction {
    Create(HistoryTarget),
    Delete(HistoryTarget),
    Update {
        before: HistoryTarget,
        after: HistoryTarget,
    },
}

impl HistoryAction {
    fn describe(&self) -> String {
        match self {
            HistoryAction::Create(t) => format!("Create {}", t.label()),
            HistoryAction::Delete(t) => format!("Delete {}", t.label()),
            HistoryAction::Update { after, .. } => format!("Update {}", after.label()),
        }
    }
}

/// A timestamped, described history record
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub description: String,
}

impl HistoryEntry {
    fn new(action: HistoryAction) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let description = action.describe();
        Self {
            action,
            timestamp,
            description,
        }
    }
}

/// Bounded two-stack undo/redo log
#[derive(Debug, Default)]
pub struct HistoryManager {
    /// Applied actions, most-recent last
    past: VecDeque<HistoryEntry>,
    /// Undone actions, next-to-redo first
    future: VecDeque<HistoryEntry>,
}

impl HistoryManager {
    /// Create a new empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a creation
    pub fn record_create(&mut self, target: HistoryTarget) {
        self.record(HistoryAction::Create(target));
    }

    /// Record a deletion
    pub fn record_delete(&mut self, target: HistoryTarget) {
        self.record(HistoryAction::Delete(target));
    }

    /// Record an update as a before/after pair
    pub fn record_update(&mut self, before: HistoryTarget, after: HistoryTarget) {
        self.record(HistoryAction::Update { before, after });
    }

    /// Append to `past` and invalidate the redo timeline
    ///
    /// Recording any new action after an undo discards `future`: the edit
    /// diverged from the undone timeline.
    fn record(&mut self, action: HistoryAction) {
        self.future.clear();
        self.past.push_back(HistoryEntry::new(action));
        if self.past.len() > MAX_HISTORY_SIZE {
            self.past.pop_front();
        }
    }

    /// Step back once, returning the action the caller must invert
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<HistoryAction> {
        let entry = self.past.pop_back()?;
        let action = entry.action.clone();
        self.future.push_front(entry);
        Some(action)
    }

    /// Step forward once, returning the original action to reapply
    ///
    /// Returns `None` when there is nothing to redo.
    pub fn redo(&mut self) -> Option<HistoryAction> {
        let entry = self.future.pop_front()?;
        let action = entry.action.clone();
        self.past.push_back(entry);
        Some(action)
    }

    /// Undo until `past` holds `index` entries, returning the actions to
    /// invert in application order
    ///
    /// Equivalent to repeated [`undo`](Self::undo) calls, as one stack
    /// transition. Used by the history-scrubber UI.
    pub fn undo_to_index(&mut self, index: usize) -> Vec<HistoryAction> {
        let mut actions = Vec::new();
        while self.past.len() > index {
            match self.undo() {
                Some(action) => actions.push(action),
                None => break,
            }
        }
        actions
    }

    /// Redo until `past` holds `index` entries, returning the actions to
    /// reapply in application order
    pub fn redo_to_index(&mut self, index: usize) -> Vec<HistoryAction> {
        let mut actions = Vec::new();
        while self.past.len() < index {
            match self.redo() {
                Some(action) => actions.push(action),
                None => break,
            }
        }
        actions
    }

    /// Empty both stacks (used when switching plans)
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }

    /// Whether an undo step is available
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// Whether a redo step is available
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of applied entries
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    /// Number of undone entries
    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Applied entries, oldest first (scrubber view)
    pub fn past_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.past.iter()
    }

    /// Undone entries, next-to-redo first (scrubber view)
    pub fn future_entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.future.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationId, AnnotationKind};
    use crate::geometry::NormalizedPoint;
    use crate::pin::{PinId, PinStatus};

    fn annotation(kind: AnnotationKind) -> HistoryTarget {
        HistoryTarget::Annotation(Annotation {
            id: AnnotationId::new_v4(),
            layer: "markup".to_string(),
            kind,
            points: vec![NormalizedPoint::new(0.0, 0.0)],
            measurement_value: None,
            measurement_unit: None,
        })
    }

    fn pin() -> HistoryTarget {
        HistoryTarget::Pin(Pin {
            id: PinId::new_v4(),
            position: NormalizedPoint::new(10.0, 10.0),
            kind: "issue".to_string(),
            status: PinStatus::Open,
            title: "Leak".to_string(),
            description: None,
            assigned_to: None,
            linked_rfi: None,
        })
    }

    #[test]
    fn test_undo_redo_single_step() {
        let mut history = HistoryManager::new();
        let target = annotation(AnnotationKind::Line);
        history.record_create(target.clone());

        let undone = history.undo().unwrap();
        assert_eq!(undone, HistoryAction::Create(target.clone()));
        assert!(!history.can_undo());
        assert!(history.can_redo());

        let redone = history.redo().unwrap();
        assert_eq!(redone, HistoryAction::Create(target));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_empty_returns_none() {
        let mut history = HistoryManager::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_clears_future() {
        let mut history = HistoryManager::new();
        history.record_create(annotation(AnnotationKind::Line));
        history.record_create(annotation(AnnotationKind::Arrow));

        history.undo().unwrap();
        assert_eq!(history.future_len(), 1);

        // Divergent timeline: a new edit invalidates the redo stack
        history.record_create(annotation(AnnotationKind::Text));
        assert_eq!(history.future_len(), 0);
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryManager::new();
        for _ in 0..MAX_HISTORY_SIZE + 10 {
            history.record_create(annotation(AnnotationKind::Line));
        }
        assert_eq!(history.past_len(), MAX_HISTORY_SIZE);
        assert_eq!(history.past_len() + history.future_len(), MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_total_never_exceeds_cap() {
        let mut history = HistoryManager::new();
        for _ in 0..MAX_HISTORY_SIZE {
            history.record_create(annotation(AnnotationKind::Line));
        }
        for _ in 0..20 {
            history.undo();
        }
        assert_eq!(history.past_len() + history.future_len(), MAX_HISTORY_SIZE);

        history.record_create(annotation(AnnotationKind::Arrow));
        assert!(history.past_len() + history.future_len() <= MAX_HISTORY_SIZE);
    }

    #[test]
    fn test_undo_to_index_returns_actions_in_order() {
        let mut history = HistoryManager::new();
        let a = annotation(AnnotationKind::Line);
        let b = annotation(AnnotationKind::Arrow);
        let c = annotation(AnnotationKind::Text);
        history.record_create(a.clone());
        history.record_create(b.clone());
        history.record_create(c.clone());

        let actions = history.undo_to_index(1);
        // Most recent first: undoing rewinds in reverse chronological order
        assert_eq!(
            actions,
            vec![HistoryAction::Create(c), HistoryAction::Create(b)]
        );
        assert_eq!(history.past_len(), 1);
        assert_eq!(history.future_len(), 2);
    }

    #[test]
    fn test_redo_to_index_replays_in_order() {
        let mut history = HistoryManager::new();
        let a = annotation(AnnotationKind::Line);
        let b = annotation(AnnotationKind::Arrow);
        history.record_create(a.clone());
        history.record_create(b.clone());
        history.undo_to_index(0);

        let actions = history.redo_to_index(2);
        // Oldest first: redo replays chronologically
        assert_eq!(
            actions,
            vec![HistoryAction::Create(a), HistoryAction::Create(b)]
        );
        assert_eq!(history.past_len(), 2);
        assert_eq!(history.future_len(), 0);
    }

    #[test]
    fn test_jump_indices_clamp() {
        let mut history = HistoryManager::new();
        history.record_create(annotation(AnnotationKind::Line));

        assert!(history.undo_to_index(5).is_empty());
        assert_eq!(history.undo_to_index(0).len(), 1);
        assert_eq!(history.redo_to_index(10).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryManager::new();
        history.record_create(annotation(AnnotationKind::Line));
        history.record_create(pin());
        history.undo();

        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_descriptions() {
        let mut history = HistoryManager::new();
        history.record_create(annotation(AnnotationKind::MeasureArea));
        history.record_delete(pin());
        history.record_create(annotation(AnnotationKind::Other("cloud".to_string())));

        let descriptions: Vec<_> = history
            .past_entries()
            .map(|e| e.description.clone())
            .collect();
        assert_eq!(descriptions[0], "Create Area measurement");
        assert_eq!(descriptions[1], "Delete issue pin");
        // Unrecognized kinds fall back to their raw string
        assert_eq!(descriptions[2], "Create cloud");
    }

    #[test]
    fn test_update_entry_holds_both_states() {
        let mut history = HistoryManager::new();
        let before = annotation(AnnotationKind::Rectangle);
        let after = annotation(AnnotationKind::Rectangle);
        history.record_update(before.clone(), after.clone());

        match history.undo().unwrap() {
            HistoryAction::Update { before: b, after: a } => {
                assert_eq!(b, before);
                assert_eq!(a, after);
            }
            other => panic!("expected update action, got {:?}", other),
        }
    }
}
