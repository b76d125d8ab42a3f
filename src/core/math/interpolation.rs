use nalgebra::{Point2, Vector3};

const EPSILON: f32 = 1e-5;

/// Barycentric weights (alpha, beta, gamma) of a point with respect to a
/// screen-space triangle (v0, v1, v2).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Barycentric(pub Vector3<f32>);

impl Barycentric {
    /// Returns `None` if the triangle is degenerate (area is near zero).
    pub fn of(p: Point2<f32>, v0: Point2<f32>, v1: Point2<f32>, v2: Point2<f32>) -> Option<Self> {
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let p_v0 = p - v0;

        // Twice the signed area of the triangle.
        let area_x2 = e1.x * e2.y - e1.y * e2.x;
        if area_x2.abs() < EPSILON {
            return None;
        }
        let inv_area_x2 = 1.0 / area_x2;

        let beta = (p_v0.x * e2.y - p_v0.y * e2.x) * inv_area_x2;
        let gamma = (e1.x * p_v0.y - e1.y * p_v0.x) * inv_area_x2;
        let alpha = 1.0 - beta - gamma;

        Some(Self(Vector3::new(alpha, beta, gamma)))
    }

    /// True when all three weights are non-negative (within tolerance).
    #[inline(always)]
    pub fn is_inside(&self) -> bool {
        self.0.x >= -EPSILON && self.0.y >= -EPSILON && self.0.z >= -EPSILON
    }

    /// Perspective-correct weights given the clip-space w of each vertex:
    /// `alpha' = (alpha / w0) / sum(weight_i / w_i)` and likewise for the others.
    ///
    /// Returns `None` when the normalizing sum is near zero.
    pub fn perspective_corrected(&self, w: [f32; 3]) -> Option<Vector3<f32>> {
        let inv = |w: f32| if w.abs() > EPSILON { 1.0 / w } else { 1.0 };
        let weighted = Vector3::new(
            self.0.x * inv(w[0]),
            self.0.y * inv(w[1]),
            self.0.z * inv(w[2]),
        );

        let sum = weighted.x + weighted.y + weighted.z;
        if sum.abs() < EPSILON {
            return None;
        }
        Some(weighted / sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> [Point2<f32>; 3] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ]
    }

    #[test]
    fn vertices_get_unit_weights() {
        let [a, b, c] = tri();
        let at_b = Barycentric::of(b, a, b, c).unwrap();
        assert!((at_b.0 - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
        assert!(at_b.is_inside());
    }

    #[test]
    fn outside_points_have_a_negative_weight() {
        let [a, b, c] = tri();
        let bary = Barycentric::of(Point2::new(5.0, 5.0), a, b, c).unwrap();
        assert!(!bary.is_inside());
    }

    #[test]
    fn degenerate_triangles_are_rejected() {
        let p = Point2::new(1.0, 1.0);
        assert!(Barycentric::of(p, p, p, Point2::new(2.0, 2.0)).is_none());
    }

    #[test]
    fn equal_w_leaves_weights_unchanged() {
        let bary = Barycentric(Vector3::new(0.2, 0.3, 0.5));
        let corrected = bary.perspective_corrected([2.0, 2.0, 2.0]).unwrap();
        assert!((corrected - bary.0).norm() < 1e-6);
    }

    #[test]
    fn nearer_vertices_pull_the_weights() {
        let bary = Barycentric(Vector3::new(0.5, 0.5, 0.0));
        let corrected = bary.perspective_corrected([1.0, 3.0, 1.0]).unwrap();
        assert!(corrected.x > corrected.y);
        assert!((corrected.sum() - 1.0).abs() < 1e-6);
    }
}
