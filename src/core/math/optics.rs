use nalgebra::Vector3;

/// Mirror reflection of incident direction `i` about unit normal `n`.
#[inline]
pub fn reflect(i: &Vector3<f32>, n: &Vector3<f32>) -> Vector3<f32> {
    i - n * (2.0 * n.dot(i))
}

/// Refraction of unit incident direction `i` through a surface with unit
/// normal `n` (facing against `i`), with `eta` the ratio of indices of
/// refraction (incident over transmitted).
///
/// Returns `None` on total internal reflection.
#[inline]
pub fn refract(i: &Vector3<f32>, n: &Vector3<f32>, eta: f32) -> Option<Vector3<f32>> {
    let cos_i = n.dot(i);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        None
    } else {
        Some(i * eta - n * (eta * cos_i + k.sqrt()))
    }
}

/// Normal-incidence reflectance of a dielectric with index `ior` in air.
#[inline]
pub fn base_reflectance(ior: f32) -> f32 {
    let r = (1.0 - ior) / (1.0 + ior);
    r * r
}

/// Schlick's approximation of the Fresnel reflectance.
#[inline]
pub fn fresnel_schlick(cos_theta: f32, f0: f32) -> f32 {
    f0 + (1.0 - f0) * (1.0 - cos_theta.clamp(0.0, 1.0)).powi(5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_on_rays_pass_straight_through() {
        let i = -Vector3::z();
        let t = refract(&i, &Vector3::z(), 1.0 / 1.5).unwrap();
        assert!((t - i).norm() < 1e-6);
    }

    #[test]
    fn oblique_rays_follow_snell() {
        let theta_i = 40f32.to_radians();
        let i = Vector3::new(theta_i.sin(), 0.0, -theta_i.cos());
        let eta = 1.0 / 1.5;
        let t = refract(&i, &Vector3::z(), eta).unwrap();

        let sin_t = t.x / t.norm();
        assert!((sin_t - eta * theta_i.sin()).abs() < 1e-5);
        assert!((t.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn grazing_exit_is_totally_reflected() {
        let theta_i = 60f32.to_radians();
        let i = Vector3::new(theta_i.sin(), 0.0, -theta_i.cos());
        assert!(refract(&i, &Vector3::z(), 1.5).is_none());
    }

    #[test]
    fn reflect_flips_the_normal_component() {
        let r = reflect(&Vector3::new(1.0, -1.0, 0.0), &Vector3::y());
        assert_eq!(r, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn fresnel_spans_f0_to_one() {
        let f0 = base_reflectance(1.5);
        assert!((f0 - 0.04).abs() < 1e-6);
        assert!((fresnel_schlick(1.0, f0) - f0).abs() < 1e-6);
        assert!((fresnel_schlick(0.0, f0) - 1.0).abs() < 1e-6);
    }
}
