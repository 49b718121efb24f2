// THEORY:
// The `geometry` module is the single trigonometric primitive the posture
// rules are built on: the angle formed at a joint by two other body points.
// Keeping it isolated means every rule measures angles the exact same way and
// the degenerate cases are handled in exactly one place.

use crate::core_modules::landmark::Landmark;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// One of the rays from the vertex has zero length, so the angle is
    /// undefined. Surfaced as an error rather than a silent NaN.
    #[error("zero-length ray at vertex ({x}, {y})")]
    DegenerateRay { x: f64, y: f64 },
}

/// Computes the angle at vertex `b` between the rays `b -> a` and `b -> c`,
/// in degrees within `[0, 180]`. Only the 2-D projection is considered.
pub fn angle_at(a: Landmark, b: Landmark, c: Landmark) -> Result<f64, GeometryError> {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    let mag_ba = (bax * bax + bay * bay).sqrt();
    let mag_bc = (bcx * bcx + bcy * bcy).sqrt();
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return Err(GeometryError::DegenerateRay { x: b.x, y: b.y });
    }

    let cosine = ((bax * bcx + bay * bcy) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    Ok(cosine.acos().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_angle_measures_ninety_degrees() {
        let a = Landmark::new(1.0, 0.0);
        let b = Landmark::new(0.0, 0.0);
        let c = Landmark::new(0.0, 1.0);

        let angle = angle_at(a, b, c).unwrap();
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn collinear_points_measure_the_extremes() {
        let b = Landmark::new(0.5, 0.5);
        let left = Landmark::new(0.0, 0.5);
        let right = Landmark::new(1.0, 0.5);

        let straight = angle_at(left, b, right).unwrap();
        assert!((straight - 180.0).abs() < 1e-9);

        let folded = angle_at(right, b, right).unwrap();
        assert!(folded.abs() < 1e-9);
    }

    #[test]
    fn angle_is_symmetric_in_its_outer_points() {
        let a = Landmark::new(0.9, 0.1);
        let b = Landmark::new(0.4, 0.6);
        let c = Landmark::new(0.2, 0.9);

        let forward = angle_at(a, b, c).unwrap();
        let backward = angle_at(c, b, a).unwrap();
        assert!((forward - backward).abs() < 1e-12);
        assert!((0.0..=180.0).contains(&forward));
    }

    #[test]
    fn coincident_vertex_is_a_degenerate_ray() {
        let b = Landmark::new(0.5, 0.5);
        let c = Landmark::new(0.6, 0.6);

        let result = angle_at(b, b, c);
        assert_eq!(result, Err(GeometryError::DegenerateRay { x: 0.5, y: 0.5 }));
    }
}
