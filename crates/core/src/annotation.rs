//! Annotation data model and store
//!
//! Geometry-typed markup records tied to a layer by name. Geometry is stored
//! in normalized percentage space; measurement annotations additionally carry
//! a cached real-world value computed with whatever calibration and container
//! size were active at creation/update time. Re-deriving that value later
//! under a different calibration may legitimately differ.

use crate::error::{MarkupError, MarkupResult};
use crate::geometry::{ContainerSize, NormalizedPoint};
use crate::layer::LayerRegistry;
use crate::scale::{distance, polygon_area, Measurement, ScaleCalibration, Unit};
use std::collections::HashMap;

/// Unique identifier for an annotation
pub type AnnotationId = uuid::Uuid;

/// Geometry type of an annotation
///
/// `Other` preserves kinds introduced after this core shipped: unrecognized
/// raw strings round-trip untouched instead of erroring.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationKind {
    Line,
    Arrow,
    Rectangle,
    Text,
    Freehand,
    MeasureDistance,
    MeasureArea,
    Other(String),
}

impl AnnotationKind {
    /// Wire-format name of this kind
    pub fn as_str(&self) -> &str {
        match self {
            AnnotationKind::Line => "line",
            AnnotationKind::Arrow => "arrow",
            AnnotationKind::Rectangle => "rectangle",
            AnnotationKind::Text => "text",
            AnnotationKind::Freehand => "freehand",
            AnnotationKind::MeasureDistance => "measure_distance",
            AnnotationKind::MeasureArea => "measure_area",
            AnnotationKind::Other(raw) => raw,
        }
    }

    /// Human-readable label, falling back to the raw string for unknown kinds
    pub fn label(&self) -> &str {
        match self {
            AnnotationKind::Line => "Line",
            AnnotationKind::Arrow => "Arrow",
            AnnotationKind::Rectangle => "Rectangle",
            AnnotationKind::Text => "Text",
            AnnotationKind::Freehand => "Freehand",
            AnnotationKind::MeasureDistance => "Distance measurement",
            AnnotationKind::MeasureArea => "Area measurement",
            AnnotationKind::Other(raw) => raw,
        }
    }
}

impl From<String> for AnnotationKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "line" => AnnotationKind::Line,
            "arrow" => AnnotationKind::Arrow,
            "rectangle" => AnnotationKind::Rectangle,
            "text" => AnnotationKind::Text,
            "freehand" => AnnotationKind::Freehand,
            "measure_distance" => AnnotationKind::MeasureDistance,
            "measure_area" => AnnotationKind::MeasureArea,
            _ => AnnotationKind::Other(raw),
        }
    }
}

impl From<AnnotationKind> for String {
    fn from(kind: AnnotationKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A drawn geometric markup or measurement marker
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Owning layer, by name
    pub layer: String,
    pub kind: AnnotationKind,
    /// Ordered normalized (0-100) points
    pub points: Vec<NormalizedPoint>,
    /// Cached real-world value; present only for measurement kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_unit: Option<Unit>,
}

/// Before/after pair returned by mutating updates, consumed by the history
/// manager
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationUpdate {
    pub before: Annotation,
    pub after: Annotation,
}

/// Store of annotations for a single plan
#[derive(Debug, Default)]
pub struct AnnotationStore {
    annotations: HashMap<AnnotationId, Annotation>,
    /// Ids in insertion order for stable listing
    order: Vec<AnnotationId>,
}

impl AnnotationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an annotation on the named layer
    ///
    /// Measurement kinds immediately compute and cache their value using the
    /// calibration active at call time (`None` fields when uncalibrated).
    ///
    /// # Errors
    /// `LockedLayer` when the target layer is locked; checked before any
    /// state change.
    pub fn create(
        &mut self,
        kind: AnnotationKind,
        points: Vec<NormalizedPoint>,
        layer_name: impl Into<String>,
        registry: &LayerRegistry,
        calibration: Option<&ScaleCalibration>,
        container: ContainerSize,
    ) -> MarkupResult<Annotation> {
        let layer = layer_name.into();
        ensure_layer_editable(registry, &layer)?;

        let measurement = compute_measurement(&kind, &points, calibration, container);
        let annotation = Annotation {
            id: AnnotationId::new_v4(),
            layer,
            kind,
            points,
            measurement_value: measurement.map(|m| m.value),
            measurement_unit: measurement.map(|m| m.unit),
        };
        self.order.push(annotation.id);
        self.annotations.insert(annotation.id, annotation.clone());
        Ok(annotation)
    }

    /// Replace an annotation's geometry, recomputing the cached measurement
    /// for measurement kinds
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `LockedLayer` when the owning layer is
    /// locked; both checked before any state change.
    pub fn update(
        &mut self,
        id: AnnotationId,
        new_points: Vec<NormalizedPoint>,
        registry: &LayerRegistry,
        calibration: Option<&ScaleCalibration>,
        container: ContainerSize,
    ) -> MarkupResult<AnnotationUpdate> {
        let before = self
            .annotations
            .get(&id)
            .ok_or(MarkupError::NotFound(id))?
            .clone();
        ensure_layer_editable(registry, &before.layer)?;

        let measurement = compute_measurement(&before.kind, &new_points, calibration, container);
        let after = Annotation {
            points: new_points,
            measurement_value: measurement.map(|m| m.value),
            measurement_unit: measurement.map(|m| m.unit),
            ..before.clone()
        };
        self.annotations.insert(id, after.clone());
        Ok(AnnotationUpdate { before, after })
    }

    /// Remove an annotation and return it, so an inverse action can reinsert
    /// it verbatim on undo
    pub fn delete(&mut self, id: AnnotationId) -> MarkupResult<Annotation> {
        let annotation = self
            .annotations
            .remove(&id)
            .ok_or(MarkupError::NotFound(id))?;
        self.order.retain(|&aid| aid != id);
        Ok(annotation)
    }

    /// Reinsert an entity verbatim
    ///
    /// Used only when applying undo/redo actions; history replay is not a
    /// user mutation, so the lock gate does not apply.
    pub fn restore(&mut self, annotation: Annotation) {
        if !self.annotations.contains_key(&annotation.id) {
            self.order.push(annotation.id);
        }
        self.annotations.insert(annotation.id, annotation);
    }

    /// Overwrite an entity in place by id (undo/redo application of an
    /// update's `before`/`after`)
    pub fn apply(&mut self, annotation: Annotation) {
        self.restore(annotation);
    }

    /// Get an annotation by id
    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// All annotations in insertion order
    pub fn all(&self) -> Vec<&Annotation> {
        self.order
            .iter()
            .filter_map(|id| self.annotations.get(id))
            .collect()
    }

    /// Annotations whose layer is currently visible
    pub fn list_visible(&self, registry: &LayerRegistry) -> Vec<&Annotation> {
        self.all()
            .into_iter()
            .filter(|a| registry.is_visible(&a.layer))
            .collect()
    }

    /// Visible annotations whose layer is also unlocked
    pub fn list_editable(&self, registry: &LayerRegistry) -> Vec<&Annotation> {
        self.all()
            .into_iter()
            .filter(|a| registry.is_visible(&a.layer) && !registry.is_locked(&a.layer))
            .collect()
    }

    /// Re-home every annotation on `from` to `to`, returning the count moved
    ///
    /// Used when a custom layer is deleted so no annotation is left dangling.
    pub fn reassign_layer(&mut self, from: &str, to: &str) -> usize {
        let mut moved = 0;
        for annotation in self.annotations.values_mut() {
            if annotation.layer == from {
                annotation.layer = to.to_string();
                moved += 1;
            }
        }
        moved
    }

    /// Number of annotations
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// Advisory lock gate, invoked by every mutation entry point
///
/// Layer locking is a cooperative UX guard rail: it gates mutations made
/// through this store, nothing more.
fn ensure_layer_editable(registry: &LayerRegistry, layer_name: &str) -> MarkupResult<()> {
    if registry.is_locked(layer_name) {
        return Err(MarkupError::LockedLayer(layer_name.to_string()));
    }
    Ok(())
}

/// Derive the cached measurement for a measurement kind, if calibrated
fn compute_measurement(
    kind: &AnnotationKind,
    points: &[NormalizedPoint],
    calibration: Option<&ScaleCalibration>,
    container: ContainerSize,
) -> Option<Measurement> {
    match kind {
        AnnotationKind::MeasureDistance => {
            let (first, last) = (points.first()?, points.last()?);
            distance(first, last, calibration, container)
        }
        AnnotationKind::MeasureArea => polygon_area(points, calibration, container),
        _ => None,
    }
}
