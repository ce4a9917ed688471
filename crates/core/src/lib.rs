//! Plan Markup Core Library
//!
//! Markup and measurement engine for construction plans: drawn annotations,
//! point markers (pins), named layers with visibility/lock control, a
//! calibrated pixel-to-real-world scale, and bounded undo/redo over every
//! edit. Geometry is stored resolution-independent (normalized 0-100
//! percentage space) and re-projected against the active calibration at read
//! time.

pub mod annotation;
pub mod error;
pub mod geometry;
pub mod history;
pub mod layer;
pub mod persistence;
pub mod pin;
pub mod scale;
pub mod session;

pub use annotation::{
    Annotation, AnnotationId, AnnotationKind, AnnotationStore, AnnotationUpdate,
};
pub use error::{MarkupError, MarkupResult};
pub use geometry::{ContainerSize, NormalizedPoint, PixelPoint};
pub use history::{
    HistoryAction, HistoryEntry, HistoryManager, HistoryTarget, MAX_HISTORY_SIZE,
};
pub use layer::{Layer, LayerId, LayerRegistry, DEFAULT_LAYERS, DEFAULT_LAYER_NAME};
pub use persistence::{
    AnnotationRecord, CalibrationRecord, LayerRecord, PersistenceError, PersistenceSink,
    PinRecord, PlanId,
};
pub use pin::{Pin, PinId, PinRegistry, PinStatus, PinUpdate};
pub use scale::{
    distance, format_measurement, pixel_distance, polygon_area, Measurement, ScaleCalibration,
    Unit,
};
pub use session::{MarkupSnapshot, PlanSession};
