//! Per-plan editing session
//!
//! Owns the layer registry, annotation store, pin registry, history manager
//! and the plan's single calibration as sibling, equally-lived objects
//! created when a plan is opened and torn down together when it is closed.
//! The session drives the control flow: mutate a store, record the returned
//! before/after entities into history, emit a persistence intent, and apply
//! the inverse/forward actions handed back by undo/redo onto the stores.
//!
//! Single-threaded and single-editor by design; every operation is a
//! synchronous function over in-memory state.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationStore, AnnotationUpdate};
use crate::error::{MarkupError, MarkupResult};
use crate::geometry::{ContainerSize, NormalizedPoint};
use crate::history::{HistoryAction, HistoryManager, HistoryTarget};
use crate::layer::{Layer, LayerId, LayerRegistry, DEFAULT_LAYER_NAME};
use crate::persistence::{
    AnnotationRecord, CalibrationRecord, LayerRecord, PersistenceError, PersistenceSink, PinRecord,
    PlanId,
};
use crate::pin::{Pin, PinId, PinRegistry, PinStatus, PinUpdate};
use crate::scale::{self, Measurement, ScaleCalibration, Unit};

/// Read-only projection of a plan's markup, handed to the export collaborator
#[derive(Debug, Clone, serde::Serialize)]
pub struct MarkupSnapshot {
    pub plan_id: PlanId,
    pub layers: Vec<Layer>,
    pub annotations: Vec<Annotation>,
    pub pins: Vec<Pin>,
    pub calibration: Option<ScaleCalibration>,
}

/// A single-editor markup session over one plan
pub struct PlanSession {
    plan_id: PlanId,
    layers: LayerRegistry,
    annotations: AnnotationStore,
    pins: PinRegistry,
    history: HistoryManager,
    calibration: Option<ScaleCalibration>,
    sink: Option<Box<dyn PersistenceSink>>,
}

impl PlanSession {
    /// Open a session, bootstrapping the default layers
    pub fn new(plan_id: PlanId) -> Self {
        let mut layers = LayerRegistry::new();
        layers.ensure_default_layers();
        Self {
            plan_id,
            layers,
            annotations: AnnotationStore::new(),
            pins: PinRegistry::new(),
            history: HistoryManager::new(),
            calibration: None,
            sink: None,
        }
    }

    /// Open a session wired to a persistence collaborator
    pub fn with_sink(plan_id: PlanId, sink: Box<dyn PersistenceSink>) -> Self {
        let mut session = Self::new(plan_id);
        session.sink = Some(sink);
        session
    }

    /// The plan this session edits
    pub fn plan_id(&self) -> PlanId {
        self.plan_id
    }

    // ---- layers ----

    /// The layer registry (read-only; mutations go through the session)
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Create a custom layer
    pub fn create_layer(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> MarkupResult<Layer> {
        let layer = self.layers.create_layer(name, color)?;
        let record = LayerRecord::from_layer(self.plan_id, None, &layer);
        self.persist(|sink| sink.save_layer(record))?;
        Ok(layer)
    }

    /// Flip a layer's visibility
    pub fn set_layer_visible(&mut self, id: LayerId, visible: bool) -> MarkupResult<()> {
        self.layers.set_visible(id, visible)?;
        self.persist_layer(id)
    }

    /// Flip a layer's lock
    pub fn set_layer_locked(&mut self, id: LayerId, locked: bool) -> MarkupResult<()> {
        self.layers.set_locked(id, locked)?;
        self.persist_layer(id)
    }

    /// Delete a custom layer, re-homing its annotations to `default`
    ///
    /// Reassignment rather than orphaning: deleting an organizational
    /// grouping must never silently lose geometry.
    pub fn delete_layer(&mut self, id: LayerId) -> MarkupResult<Layer> {
        let layer = self.layers.delete_layer(id)?;
        let moved = self.annotations.reassign_layer(&layer.name, DEFAULT_LAYER_NAME);
        if moved > 0 {
            log::debug!(
                "reassigned {} annotation(s) from deleted layer '{}' to '{}'",
                moved,
                layer.name,
                DEFAULT_LAYER_NAME
            );
        }
        let plan_id = self.plan_id;
        self.persist(|sink| sink.delete_layer(plan_id, id))?;
        Ok(layer)
    }

    // ---- calibration ----

    /// The active calibration, if any
    pub fn calibration(&self) -> Option<&ScaleCalibration> {
        self.calibration.as_ref()
    }

    /// Calibrate from a reference line, replacing any previous calibration
    /// wholesale
    pub fn calibrate(
        &mut self,
        start: NormalizedPoint,
        end: NormalizedPoint,
        reference_length: f32,
        unit: Unit,
        container: ContainerSize,
    ) -> MarkupResult<ScaleCalibration> {
        let calibration =
            ScaleCalibration::calibrate(start, end, reference_length, unit, container)?;
        self.calibration = Some(calibration.clone());
        let record = CalibrationRecord::from_calibration(self.plan_id, &calibration);
        self.persist(|sink| sink.save_calibration(record))?;
        Ok(calibration)
    }

    /// Real-world distance under the active calibration
    pub fn measure_distance(
        &self,
        p1: &NormalizedPoint,
        p2: &NormalizedPoint,
        container: ContainerSize,
    ) -> Option<Measurement> {
        scale::distance(p1, p2, self.calibration.as_ref(), container)
    }

    /// Real-world polygon area under the active calibration
    pub fn measure_area(
        &self,
        points: &[NormalizedPoint],
        container: ContainerSize,
    ) -> Option<Measurement> {
        scale::polygon_area(points, self.calibration.as_ref(), container)
    }

    // ---- annotations ----

    /// The annotation store (read-only; mutations go through the session)
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// Annotations on currently visible layers
    pub fn visible_annotations(&self) -> Vec<&Annotation> {
        self.annotations.list_visible(&self.layers)
    }

    /// Annotations on visible, unlocked layers
    pub fn editable_annotations(&self) -> Vec<&Annotation> {
        self.annotations.list_editable(&self.layers)
    }

    /// Create an annotation and record it into history
    pub fn create_annotation(
        &mut self,
        kind: AnnotationKind,
        points: Vec<NormalizedPoint>,
        layer_name: impl Into<String>,
        container: ContainerSize,
    ) -> MarkupResult<Annotation> {
        let annotation = self.annotations.create(
            kind,
            points,
            layer_name,
            &self.layers,
            self.calibration.as_ref(),
            container,
        )?;
        self.history
            .record_create(HistoryTarget::Annotation(annotation.clone()));
        let record = AnnotationRecord::from_annotation(self.plan_id, &annotation);
        self.persist(|sink| sink.save_annotation(record))?;
        Ok(annotation)
    }

    /// Replace an annotation's geometry and record the before/after pair
    pub fn update_annotation(
        &mut self,
        id: AnnotationId,
        new_points: Vec<NormalizedPoint>,
        container: ContainerSize,
    ) -> MarkupResult<AnnotationUpdate> {
        let update = self.annotations.update(
            id,
            new_points,
            &self.layers,
            self.calibration.as_ref(),
            container,
        )?;
        self.history.record_update(
            HistoryTarget::Annotation(update.before.clone()),
            HistoryTarget::Annotation(update.after.clone()),
        );
        let record = AnnotationRecord::from_annotation(self.plan_id, &update.after);
        self.persist(|sink| sink.save_annotation(record))?;
        Ok(update)
    }

    /// Delete an annotation, record the deletion, and clean up stored assets
    /// on a best-effort basis
    pub fn delete_annotation(&mut self, id: AnnotationId) -> MarkupResult<Annotation> {
        let annotation = self.annotations.delete(id)?;
        self.history
            .record_delete(HistoryTarget::Annotation(annotation.clone()));
        let plan_id = self.plan_id;
        self.persist(|sink| sink.delete_annotation(plan_id, id))?;

        // Orphaned-asset cleanup may fail without blocking the local removal
        if let Some(sink) = self.sink.as_deref_mut() {
            if let Err(err) = sink.cleanup_assets(plan_id, id) {
                log::warn!("asset cleanup failed for annotation {}: {}", id, err);
            }
        }
        Ok(annotation)
    }

    // ---- pins ----

    /// The pin registry (read-only; mutations go through the session)
    pub fn pins(&self) -> &PinRegistry {
        &self.pins
    }

    /// Create a pin and record it into history
    pub fn create_pin(
        &mut self,
        position: NormalizedPoint,
        kind: impl Into<String>,
        title: impl Into<String>,
        assigned_to: Option<String>,
    ) -> MarkupResult<Pin> {
        let pin = self.pins.create(position, kind, title, assigned_to);
        self.history.record_create(HistoryTarget::Pin(pin.clone()));
        let record = PinRecord::from_pin(self.plan_id, &pin);
        self.persist(|sink| sink.save_pin(record))?;
        Ok(pin)
    }

    /// Set a pin's status and record the before/after pair
    pub fn update_pin_status(&mut self, id: PinId, status: PinStatus) -> MarkupResult<PinUpdate> {
        let update = self.pins.update_status(id, status)?;
        self.history.record_update(
            HistoryTarget::Pin(update.before.clone()),
            HistoryTarget::Pin(update.after.clone()),
        );
        let record = PinRecord::from_pin(self.plan_id, &update.after);
        self.persist(|sink| sink.save_pin(record))?;
        Ok(update)
    }

    /// Delete a pin and record the deletion
    pub fn delete_pin(&mut self, id: PinId) -> MarkupResult<Pin> {
        let pin = self.pins.delete(id)?;
        self.history.record_delete(HistoryTarget::Pin(pin.clone()));
        let plan_id = self.plan_id;
        self.persist(|sink| sink.delete_pin(plan_id, id))?;
        Ok(pin)
    }

    // ---- history ----

    /// The history log (scrubber view)
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Undo one step; returns false when there was nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(action) => {
                self.apply_inverse(action);
                true
            }
            None => false,
        }
    }

    /// Redo one step; returns false when there was nothing to redo
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(action) => {
                self.apply_forward(action);
                true
            }
            None => false,
        }
    }

    /// Jump back until `past` holds `index` entries, returning the number of
    /// steps applied
    pub fn undo_to_index(&mut self, index: usize) -> usize {
        let actions = self.history.undo_to_index(index);
        let count = actions.len();
        for action in actions {
            self.apply_inverse(action);
        }
        count
    }

    /// Jump forward until `past` holds `index` entries, returning the number
    /// of steps applied
    pub fn redo_to_index(&mut self, index: usize) -> usize {
        let actions = self.history.redo_to_index(index);
        let count = actions.len();
        for action in actions {
            self.apply_forward(action);
        }
        count
    }

    /// Drop both history stacks (used when switching plans)
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Apply the inverse of a recorded action onto the stores
    ///
    /// History replay is not a user mutation, so the layer lock gate does
    /// not apply here.
    fn apply_inverse(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::Create(HistoryTarget::Annotation(a)) => {
                let _ = self.annotations.delete(a.id);
            }
            HistoryAction::Create(HistoryTarget::Pin(p)) => {
                let _ = self.pins.delete(p.id);
            }
            HistoryAction::Delete(HistoryTarget::Annotation(a)) => self.annotations.restore(a),
            HistoryAction::Delete(HistoryTarget::Pin(p)) => self.pins.restore(p),
            HistoryAction::Update { before, .. } => match before {
                HistoryTarget::Annotation(a) => self.annotations.apply(a),
                HistoryTarget::Pin(p) => self.pins.apply(p),
            },
        }
    }

    /// Reapply a recorded action onto the stores
    fn apply_forward(&mut self, action: HistoryAction) {
        match action {
            HistoryAction::Create(HistoryTarget::Annotation(a)) => self.annotations.restore(a),
            HistoryAction::Create(HistoryTarget::Pin(p)) => self.pins.restore(p),
            HistoryAction::Delete(HistoryTarget::Annotation(a)) => {
                let _ = self.annotations.delete(a.id);
            }
            HistoryAction::Delete(HistoryTarget::Pin(p)) => {
                let _ = self.pins.delete(p.id);
            }
            HistoryAction::Update { after, .. } => match after {
                HistoryTarget::Annotation(a) => self.annotations.apply(a),
                HistoryTarget::Pin(p) => self.pins.apply(p),
            },
        }
    }

    // ---- export ----

    /// Read-only snapshot for the export collaborator
    pub fn snapshot(&self) -> MarkupSnapshot {
        MarkupSnapshot {
            plan_id: self.plan_id,
            layers: self.layers.layers().into_iter().cloned().collect(),
            annotations: self.annotations.all().into_iter().cloned().collect(),
            pins: self.pins.all().into_iter().cloned().collect(),
            calibration: self.calibration.clone(),
        }
    }

    // ---- persistence plumbing ----

    fn persist_layer(&mut self, id: LayerId) -> MarkupResult<()> {
        let record = self
            .layers
            .get(id)
            .map(|layer| LayerRecord::from_layer(self.plan_id, None, layer));
        match record {
            Some(record) => self.persist(|sink| sink.save_layer(record)),
            None => Ok(()),
        }
    }

    /// Push an intent into the sink, if one is attached
    ///
    /// Sink failures bubble as `MarkupError::Persistence`; the optimistic
    /// local state is never rolled back.
    fn persist(
        &mut self,
        intent: impl FnOnce(&mut dyn PersistenceSink) -> Result<(), PersistenceError>,
    ) -> MarkupResult<()> {
        match self.sink.as_deref_mut() {
            Some(sink) => intent(sink).map_err(MarkupError::from),
            None => Ok(()),
        }
    }
}
