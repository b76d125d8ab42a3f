use nalgebra::{Point3, Vector3};

const EPSILON: f32 = 1e-7;
/// Barycentric slack so rays through shared edges and vertices are not lost
/// to rounding.
const EDGE_TOLERANCE: f32 = 1e-5;

/// Möller–Trumbore ray/triangle intersection.
///
/// Returns the ray parameter `t > 0` of the hit, counting both faces.
/// Hits on an edge count for both triangles sharing it.
pub fn ray_triangle(
    origin: &Point3<f32>,
    dir: &Vector3<f32>,
    v0: &Point3<f32>,
    v1: &Point3<f32>,
    v2: &Point3<f32>,
) -> Option<f32> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - v0;
    let u = s.dot(&p) * inv_det;
    if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    (t > EPSILON).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> [Point3<f32>; 3] {
        [
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn hits_from_either_side() {
        let [a, b, c] = unit_triangle();
        let t = ray_triangle(&Point3::new(0.0, 0.0, 2.0), &-Vector3::z(), &a, &b, &c);
        assert_eq!(t, Some(2.0));
        let t = ray_triangle(&Point3::new(0.0, 0.0, -3.0), &Vector3::z(), &a, &b, &c);
        assert_eq!(t, Some(3.0));
    }

    #[test]
    fn misses_behind_and_beside() {
        let [a, b, c] = unit_triangle();
        assert!(ray_triangle(&Point3::new(0.0, 0.0, 2.0), &Vector3::z(), &a, &b, &c).is_none());
        assert!(ray_triangle(&Point3::new(5.0, 0.0, 2.0), &-Vector3::z(), &a, &b, &c).is_none());
        assert!(ray_triangle(&Point3::new(0.0, 0.0, 2.0), &Vector3::x(), &a, &b, &c).is_none());
    }
}
