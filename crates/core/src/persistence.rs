//! Wire records for the external persistence collaborator
//!
//! The core is a library; remote storage is an external collaborator that
//! receives create/update/delete intents keyed by plan id and answers
//! asynchronously. The core never waits on it: local state is optimistic
//! truth and stays internally consistent regardless of what the collaborator
//! reports back.

use crate::annotation::{Annotation, AnnotationId};
use crate::error::MarkupError;
use crate::geometry::NormalizedPoint;
use crate::layer::{Layer, LayerId};
use crate::pin::{Pin, PinId, PinStatus};
use crate::scale::{ScaleCalibration, Unit};
use uuid::Uuid;

/// Opaque identifier of the plan annotations live on
pub type PlanId = Uuid;

/// Failure reported by the persistence collaborator
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PersistenceError(pub String);

impl From<PersistenceError> for MarkupError {
    fn from(err: PersistenceError) -> Self {
        MarkupError::Persistence(err.0)
    }
}

/// Layer intent payload
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerRecord {
    pub id: LayerId,
    pub plan_id: PlanId,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub color: String,
    pub is_visible: bool,
    pub is_locked: bool,
    pub sort_order: u32,
}

impl LayerRecord {
    pub fn from_layer(plan_id: PlanId, project_id: Option<Uuid>, layer: &Layer) -> Self {
        Self {
            id: layer.id,
            plan_id,
            project_id,
            name: layer.name.clone(),
            color: layer.color.clone(),
            is_visible: layer.visible,
            is_locked: layer.locked,
            sort_order: layer.sort_order,
        }
    }
}

/// Annotation intent payload
///
/// Points stay normalized; pixel-space values are never sent over the wire.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub plan_id: PlanId,
    pub layer: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: Vec<NormalizedPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_unit: Option<Unit>,
}

impl AnnotationRecord {
    pub fn from_annotation(plan_id: PlanId, annotation: &Annotation) -> Self {
        Self {
            id: annotation.id,
            plan_id,
            layer: annotation.layer.clone(),
            kind: annotation.kind.as_str().to_string(),
            points: annotation.points.clone(),
            measurement_value: annotation.measurement_value,
            measurement_unit: annotation.measurement_unit,
        }
    }
}

/// Pin intent payload
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PinRecord {
    pub id: PinId,
    pub plan_id: PlanId,
    pub x: f32,
    pub y: f32,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: PinStatus,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl PinRecord {
    pub fn from_pin(plan_id: PlanId, pin: &Pin) -> Self {
        Self {
            id: pin.id,
            plan_id,
            x: pin.position.x,
            y: pin.position.y,
            kind: pin.kind.clone(),
            status: pin.status,
            title: pin.title.clone(),
            description: pin.description.clone(),
            assigned_to: pin.assigned_to.clone(),
        }
    }
}

/// The plan's single scale calibration blob
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationRecord {
    pub plan_id: PlanId,
    pub pixels_per_unit: f32,
    pub unit: Unit,
    pub reference_length: f32,
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl CalibrationRecord {
    pub fn from_calibration(plan_id: PlanId, calibration: &ScaleCalibration) -> Self {
        Self {
            plan_id,
            pixels_per_unit: calibration.pixels_per_unit,
            unit: calibration.unit,
            reference_length: calibration.reference_length,
            start_x: calibration.start.x,
            start_y: calibration.start.y,
            end_x: calibration.end.x,
            end_y: calibration.end.y,
        }
    }
}

/// Sink the session pushes persistence intents into
///
/// Implementations are free to queue and confirm asynchronously; every
/// method is fire-and-forget from the core's perspective. `cleanup_assets`
/// is the one best-effort call: its failures are logged by the session and
/// never raised.
pub trait PersistenceSink {
    fn save_layer(&mut self, record: LayerRecord) -> Result<(), PersistenceError>;
    fn delete_layer(&mut self, plan_id: PlanId, id: LayerId) -> Result<(), PersistenceError>;
    fn save_annotation(&mut self, record: AnnotationRecord) -> Result<(), PersistenceError>;
    fn delete_annotation(&mut self, plan_id: PlanId, id: AnnotationId)
        -> Result<(), PersistenceError>;
    fn save_pin(&mut self, record: PinRecord) -> Result<(), PersistenceError>;
    fn delete_pin(&mut self, plan_id: PlanId, id: PinId) -> Result<(), PersistenceError>;
    fn save_calibration(&mut self, record: CalibrationRecord) -> Result<(), PersistenceError>;
    /// Remove stored assets orphaned by a deletion (best-effort)
    fn cleanup_assets(&mut self, plan_id: PlanId, id: AnnotationId)
        -> Result<(), PersistenceError>;
}
