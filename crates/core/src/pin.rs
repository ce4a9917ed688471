//! Pin registry
//!
//! Point-based issue/task markers, independent of layers. Status transitions
//! are unconditionally accepted: the product intentionally lets users reopen
//! closed pins.

use crate::error::{MarkupError, MarkupResult};
use crate::geometry::NormalizedPoint;
use std::collections::HashMap;

/// Unique identifier for a pin
pub type PinId = uuid::Uuid;

/// Workflow status of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// A point marker on the plan
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub position: NormalizedPoint,
    /// Free-form marker kind (e.g. "issue", "rfi", "photo")
    pub kind: String,
    pub status: PinStatus,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_rfi: Option<String>,
}

/// Before/after pair returned by status updates, consumed by the history
/// manager
#[derive(Debug, Clone, PartialEq)]
pub struct PinUpdate {
    pub before: Pin,
    pub after: Pin,
}

/// Registry of pins for a single plan
#[derive(Debug, Default)]
pub struct PinRegistry {
    pins: HashMap<PinId, Pin>,
    /// Ids in insertion order for stable listing
    order: Vec<PinId>,
}

impl PinRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pin; new pins always start open
    pub fn create(
        &mut self,
        position: NormalizedPoint,
        kind: impl Into<String>,
        title: impl Into<String>,
        assigned_to: Option<String>,
    ) -> Pin {
        let pin = Pin {
            id: PinId::new_v4(),
            position,
            kind: kind.into(),
            status: PinStatus::Open,
            title: title.into(),
            description: None,
            assigned_to,
            linked_rfi: None,
        };
        self.order.push(pin.id);
        self.pins.insert(pin.id, pin.clone());
        pin
    }

    /// Set a pin's status; any transition is accepted
    pub fn update_status(&mut self, id: PinId, status: PinStatus) -> MarkupResult<PinUpdate> {
        let pin = self.pins.get_mut(&id).ok_or(MarkupError::NotFound(id))?;
        let before = pin.clone();
        pin.status = status;
        Ok(PinUpdate {
            before,
            after: pin.clone(),
        })
    }

    /// Remove a pin and return it, so an inverse action can reinsert it
    /// verbatim on undo
    pub fn delete(&mut self, id: PinId) -> MarkupResult<Pin> {
        let pin = self.pins.remove(&id).ok_or(MarkupError::NotFound(id))?;
        self.order.retain(|&pid| pid != id);
        Ok(pin)
    }

    /// Reinsert an entity verbatim (undo/redo application only)
    pub fn restore(&mut self, pin: Pin) {
        if !self.pins.contains_key(&pin.id) {
            self.order.push(pin.id);
        }
        self.pins.insert(pin.id, pin);
    }

    /// Overwrite an entity in place by id (undo/redo application of an
    /// update's `before`/`after`)
    pub fn apply(&mut self, pin: Pin) {
        self.restore(pin);
    }

    /// Get a pin by id
    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(&id)
    }

    /// All pins in insertion order
    pub fn all(&self) -> Vec<&Pin> {
        self.order.iter().filter_map(|id| self.pins.get(id)).collect()
    }

    /// Number of pins
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}
