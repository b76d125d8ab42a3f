use nalgebra::Vector3;

/// Display gamma used for both decoding images and encoding frames.
pub const GAMMA: f32 = 2.2;

/// ACES (Academy Color Encoding System) filmic tone mapping curve.
/// Maps bright environment texels into [0, 1] with a film-like shoulder.
pub fn aces_tone_mapping(color: Vector3<f32>) -> Vector3<f32> {
    const A: f32 = 2.51;
    const B: f32 = 0.03;
    const C: f32 = 2.43;
    const D: f32 = 0.59;
    const E: f32 = 0.14;

    color.map(|x| ((x * (A * x + B)) / (x * (C * x + D) + E)).clamp(0.0, 1.0))
}

/// One 8-bit sRGB channel to linear.
#[inline]
pub fn decode_srgb8(channel: u8) -> f32 {
    (channel as f32 / 255.0).powf(GAMMA)
}

/// One linear channel to 8-bit sRGB, clamped.
#[inline]
pub fn encode_srgb8(linear: f32) -> u8 {
    (linear.clamp(0.0, 1.0).powf(1.0 / GAMMA) * 255.0).round() as u8
}

/// Linear RGB to an opaque RGBA8 pixel.
pub fn to_rgba8(color: Vector3<f32>) -> [u8; 4] {
    [
        encode_srgb8(color.x),
        encode_srgb8(color.y),
        encode_srgb8(color.z),
        255,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_channels_survive_a_round_trip() {
        for c in [0u8, 1, 64, 128, 200, 255] {
            assert_eq!(encode_srgb8(decode_srgb8(c)), c);
        }
    }

    #[test]
    fn aces_keeps_black_and_saturates_bright_values() {
        let mapped = aces_tone_mapping(Vector3::new(0.0, 0.5, 100.0));
        assert!(mapped.x.abs() < 0.01);
        assert!(mapped.y > 0.0 && mapped.y < 1.0);
        assert_eq!(mapped.z, 1.0);
    }
}
