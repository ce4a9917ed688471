//! Layer registry
//!
//! Named, orderable groupings of annotations with visibility and lock state.
//! Four default layers are always obtainable through an idempotent bootstrap
//! and can never be deleted. The registry has no dependency on the other
//! components; annotation stores read it to filter by visibility/lock.

use crate::error::{MarkupError, MarkupResult};
use std::collections::HashMap;

/// Unique identifier for a layer
pub type LayerId = uuid::Uuid;

/// The guaranteed base organization every plan can rely on, in bootstrap
/// order. These names are never deletable.
pub const DEFAULT_LAYERS: [(&str, &str); 4] = [
    ("default", "#6b7280"),
    ("markup", "#ef4444"),
    ("measurements", "#3b82f6"),
    ("notes", "#f59e0b"),
];

/// Name of the layer orphaned annotations are reassigned to
pub const DEFAULT_LAYER_NAME: &str = "default";

/// A named grouping of annotations
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    pub id: LayerId,
    /// Unique within a plan
    pub name: String,
    /// Display color as a hex string
    pub color: String,
    pub visible: bool,
    pub locked: bool,
    /// Append-only stacking position; determines display order
    pub sort_order: u32,
}

/// Registry of layers for a single plan
#[derive(Debug, Default)]
pub struct LayerRegistry {
    layers: HashMap<LayerId, Layer>,
    /// Ids in append order (matches `sort_order`)
    order: Vec<LayerId>,
}

impl LayerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer appended at the end of the stacking order
    ///
    /// # Errors
    /// `Validation` for a blank name or a name already in use.
    pub fn create_layer(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> MarkupResult<Layer> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MarkupError::Validation(
                "layer name cannot be blank".to_string(),
            ));
        }
        if self.get_by_name(&name).is_some() {
            return Err(MarkupError::Validation(format!(
                "layer '{}' already exists",
                name
            )));
        }

        // One past the current maximum, not the count: deleting a custom
        // layer must never let a later create reuse a live sort_order
        let sort_order = self
            .layers
            .values()
            .map(|l| l.sort_order + 1)
            .max()
            .unwrap_or(0);
        let layer = Layer {
            id: LayerId::new_v4(),
            name,
            color: color.into(),
            visible: true,
            locked: false,
            sort_order,
        };
        self.order.push(layer.id);
        self.layers.insert(layer.id, layer.clone());
        Ok(layer)
    }

    /// Insert the default layers absent from the current set
    ///
    /// Idempotent and append-only: safe to call every time the markup panel
    /// opens. Existing layers (default or custom) keep their positions.
    pub fn ensure_default_layers(&mut self) {
        for (name, color) in DEFAULT_LAYERS {
            if self.get_by_name(name).is_none() {
                // Names come from the fixed table, so create cannot fail
                let _ = self.create_layer(name, color);
            }
        }
    }

    /// Set a layer's visibility flag
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> MarkupResult<()> {
        let layer = self.layers.get_mut(&id).ok_or(MarkupError::NotFound(id))?;
        layer.visible = visible;
        Ok(())
    }

    /// Set a layer's lock flag
    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> MarkupResult<()> {
        let layer = self.layers.get_mut(&id).ok_or(MarkupError::NotFound(id))?;
        layer.locked = locked;
        Ok(())
    }

    /// Remove a layer and return it
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `Validation` for any of the default
    /// layer names.
    pub fn delete_layer(&mut self, id: LayerId) -> MarkupResult<Layer> {
        let layer = self.layers.get(&id).ok_or(MarkupError::NotFound(id))?;
        if DEFAULT_LAYERS.iter().any(|(name, _)| *name == layer.name) {
            return Err(MarkupError::Validation(format!(
                "default layer '{}' cannot be deleted",
                layer.name
            )));
        }

        self.order.retain(|&lid| lid != id);
        Ok(self.layers.remove(&id).expect("presence checked above"))
    }

    /// Get a layer by id
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Get a layer by name
    pub fn get_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.values().find(|l| l.name == name)
    }

    /// All layers in stacking order
    pub fn layers(&self) -> Vec<&Layer> {
        self.order
            .iter()
            .filter_map(|id| self.layers.get(id))
            .collect()
    }

    /// Whether the named layer is currently visible (false for unknown names)
    pub fn is_visible(&self, name: &str) -> bool {
        self.get_by_name(name).map(|l| l.visible).unwrap_or(false)
    }

    /// Whether the named layer is currently locked (false for unknown names)
    pub fn is_locked(&self, name: &str) -> bool {
        self.get_by_name(name).map(|l| l.locked).unwrap_or(false)
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
