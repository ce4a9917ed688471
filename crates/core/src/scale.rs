//! Scale calibration and measurement engine
//!
//! Pure geometry: pixel-to-real-world conversion, distance, polygon area
//! (Shoelace formula) and label formatting. Because geometry is stored
//! normalized, a measurement's real-world value is only meaningful relative
//! to the container size at evaluation time; nothing here assumes a fixed
//! rendering surface.

use crate::error::{MarkupError, MarkupResult};
use crate::geometry::{ContainerSize, NormalizedPoint};

/// Real-world measurement unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Ft,
    M,
    In,
    Cm,
}

impl Unit {
    /// Short unit label as shown next to measurement values
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Ft => "ft",
            Unit::M => "m",
            Unit::In => "in",
            Unit::Cm => "cm",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel-to-real-world mapping derived from a user-drawn reference line
///
/// Exactly zero or one per plan; recalibration replaces the whole value,
/// never merges. The reference endpoints are kept so the calibration line
/// can be redrawn.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScaleCalibration {
    /// Pixels per real-world unit at the calibration container size
    pub pixels_per_unit: f32,
    pub unit: Unit,
    /// Real-world length the reference line represents
    pub reference_length: f32,
    /// Reference line start (normalized)
    pub start: NormalizedPoint,
    /// Reference line end (normalized)
    pub end: NormalizedPoint,
}

impl ScaleCalibration {
    /// Calibrate from a reference line with a known real-world length
    ///
    /// # Errors
    /// Returns `MarkupError::Validation` if `reference_length` is not
    /// strictly positive.
    pub fn calibrate(
        start: NormalizedPoint,
        end: NormalizedPoint,
        reference_length: f32,
        unit: Unit,
        container: ContainerSize,
    ) -> MarkupResult<Self> {
        if reference_length <= 0.0 {
            return Err(MarkupError::Validation(
                "calibration reference length must be positive".to_string(),
            ));
        }

        let pixels = pixel_distance(&start, &end, container);
        Ok(Self {
            pixels_per_unit: pixels / reference_length,
            unit,
            reference_length,
            start,
            end,
        })
    }
}

/// A real-world value with its unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub value: f32,
    pub unit: Unit,
    /// True for areas, whose values are in squared units
    pub squared: bool,
}

impl Measurement {
    /// Display label; squared (area) values render with a `²` unit suffix
    pub fn label(&self, decimals: usize) -> String {
        if self.squared {
            format_with_unit(self.value, &format!("{}²", self.unit), decimals)
        } else {
            format_with_unit(self.value, self.unit.as_str(), decimals)
        }
    }
}

/// Pixel distance between two normalized points at the given container size
pub fn pixel_distance(p1: &NormalizedPoint, p2: &NormalizedPoint, container: ContainerSize) -> f32 {
    p1.to_pixels(container).distance_to(&p2.to_pixels(container))
}

/// Real-world distance between two normalized points
///
/// Returns `None` when no calibration is set.
pub fn distance(
    p1: &NormalizedPoint,
    p2: &NormalizedPoint,
    calibration: Option<&ScaleCalibration>,
    container: ContainerSize,
) -> Option<Measurement> {
    let calibration = calibration?;
    let pixels = pixel_distance(p1, p2, container);
    Some(Measurement {
        value: pixels / calibration.pixels_per_unit,
        unit: calibration.unit,
        squared: false,
    })
}

/// Real-world polygon area via the Shoelace formula, in squared units
///
/// Points are projected to pixel space first, then the signed shoelace sum is
/// taken in absolute value, so winding order does not affect the result.
/// Returns `None` for fewer than 3 points or when no calibration is set.
pub fn polygon_area(
    points: &[NormalizedPoint],
    calibration: Option<&ScaleCalibration>,
    container: ContainerSize,
) -> Option<Measurement> {
    let calibration = calibration?;
    if points.len() < 3 {
        return None;
    }

    let pixels: Vec<_> = points.iter().map(|p| p.to_pixels(container)).collect();
    let n = pixels.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += pixels[i].x * pixels[j].y;
        area -= pixels[j].x * pixels[i].y;
    }
    let pixel_area = (area / 2.0).abs();

    let ppu = calibration.pixels_per_unit;
    Some(Measurement {
        value: pixel_area / (ppu * ppu),
        unit: calibration.unit,
        squared: true,
    })
}

/// Format a measurement value for display
///
/// Values of 1000 and above collapse to a `k` suffix; everything else is
/// rendered with fixed decimals.
pub fn format_measurement(value: f32, unit: Unit, decimals: usize) -> String {
    format_with_unit(value, unit.as_str(), decimals)
}

fn format_with_unit(value: f32, unit: &str, decimals: usize) -> String {
    if value >= 1000.0 {
        format!("{:.*}k {}", decimals, value / 1000.0, unit)
    } else {
        format!("{:.*} {}", decimals, value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: ContainerSize = ContainerSize {
        width: 1000.0,
        height: 1000.0,
    };

    #[test]
    fn test_calibrate() {
        // 10% of a 1000px container = 100 pixels representing 10 ft
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            10.0,
            Unit::Ft,
            CONTAINER,
        )
        .unwrap();

        assert_eq!(cal.pixels_per_unit, 10.0);
        assert_eq!(cal.unit, Unit::Ft);
    }

    #[test]
    fn test_calibrate_rejects_non_positive_reference() {
        for bad in [0.0, -5.0] {
            let result = ScaleCalibration::calibrate(
                NormalizedPoint::new(0.0, 0.0),
                NormalizedPoint::new(10.0, 0.0),
                bad,
                Unit::M,
                CONTAINER,
            );
            assert!(matches!(result, Err(MarkupError::Validation(_))));
        }
    }

    #[test]
    fn test_distance_with_calibration() {
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            10.0,
            Unit::Ft,
            CONTAINER,
        )
        .unwrap();

        // 250 pixels at 10 px/ft reports 25 ft
        let m = distance(
            &NormalizedPoint::new(0.0, 0.0),
            &NormalizedPoint::new(25.0, 0.0),
            Some(&cal),
            CONTAINER,
        )
        .unwrap();

        assert!((m.value - 25.0).abs() < 0.001);
        assert_eq!(m.unit, Unit::Ft);
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            10.0,
            Unit::M,
            CONTAINER,
        )
        .unwrap();

        let p = NormalizedPoint::new(37.5, 62.5);
        let m = distance(&p, &p, Some(&cal), CONTAINER).unwrap();
        assert_eq!(m.value, 0.0);
    }

    #[test]
    fn test_distance_without_calibration() {
        let m = distance(
            &NormalizedPoint::new(0.0, 0.0),
            &NormalizedPoint::new(10.0, 0.0),
            None,
            CONTAINER,
        );
        assert!(m.is_none());
    }

    #[test]
    fn test_polygon_area_unit_square() {
        // 100 px/unit -> a 100px-sided square measures 1 square unit
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            1.0,
            Unit::M,
            CONTAINER,
        )
        .unwrap();

        let square = vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            NormalizedPoint::new(10.0, 10.0),
            NormalizedPoint::new(0.0, 10.0),
        ];

        let m = polygon_area(&square, Some(&cal), CONTAINER).unwrap();
        assert!((m.value - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_polygon_area_winding_independent() {
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            1.0,
            Unit::M,
            CONTAINER,
        )
        .unwrap();

        let ccw = vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            NormalizedPoint::new(5.0, 10.0),
        ];
        let cw: Vec<_> = ccw.iter().rev().copied().collect();

        let a = polygon_area(&ccw, Some(&cal), CONTAINER).unwrap();
        let b = polygon_area(&cw, Some(&cal), CONTAINER).unwrap();
        assert!((a.value - b.value).abs() < 0.001);
        assert!(a.value > 0.0);
    }

    #[test]
    fn test_polygon_area_degenerate_inputs() {
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            1.0,
            Unit::M,
            CONTAINER,
        )
        .unwrap();

        let two_points = vec![NormalizedPoint::new(0.0, 0.0), NormalizedPoint::new(10.0, 0.0)];
        assert!(polygon_area(&two_points, Some(&cal), CONTAINER).is_none());

        let triangle = vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            NormalizedPoint::new(5.0, 10.0),
        ];
        assert!(polygon_area(&triangle, None, CONTAINER).is_none());
    }

    #[test]
    fn test_area_label_carries_squared_unit() {
        // 100 px/m -> a 100px-sided unit square measures 1 m²
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            1.0,
            Unit::M,
            CONTAINER,
        )
        .unwrap();

        let square = vec![
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            NormalizedPoint::new(10.0, 10.0),
            NormalizedPoint::new(0.0, 10.0),
        ];

        let m = polygon_area(&square, Some(&cal), CONTAINER).unwrap();
        assert!(m.squared);
        assert_eq!(m.label(2), "1.00 m²");
    }

    #[test]
    fn test_distance_label_is_linear() {
        let cal = ScaleCalibration::calibrate(
            NormalizedPoint::new(0.0, 0.0),
            NormalizedPoint::new(10.0, 0.0),
            10.0,
            Unit::Ft,
            CONTAINER,
        )
        .unwrap();

        let m = distance(
            &NormalizedPoint::new(0.0, 0.0),
            &NormalizedPoint::new(25.0, 0.0),
            Some(&cal),
            CONTAINER,
        )
        .unwrap();
        assert!(!m.squared);
        assert_eq!(m.label(2), "25.00 ft");
    }

    #[test]
    fn test_large_area_label_keeps_k_suffix() {
        let m = Measurement {
            value: 1500.0,
            unit: Unit::Ft,
            squared: true,
        };
        assert_eq!(m.label(2), "1.50k ft²");
    }

    #[test]
    fn test_format_measurement() {
        assert_eq!(format_measurement(25.0, Unit::Ft, 2), "25.00 ft");
        assert_eq!(format_measurement(999.994, Unit::M, 2), "999.99 m");
        assert_eq!(format_measurement(1500.0, Unit::Ft, 2), "1.50k ft");
        assert_eq!(format_measurement(1000.0, Unit::Cm, 1), "1.0k cm");
    }

    #[test]
    fn test_unit_serde_names() {
        assert_eq!(serde_json::to_string(&Unit::Ft).unwrap(), "\"ft\"");
        assert_eq!(serde_json::from_str::<Unit>("\"cm\"").unwrap(), Unit::Cm);
    }
}
