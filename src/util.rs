use nalgebra as na;
use na::{vector, Vector2, Vector3, Vector4};

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Perspective division, keeping w so it can still be read afterwards.
/// x, y and z are divided, w is left as is.
pub fn divide_by_w(v: Vector4<f32>) -> Vector4<f32> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w, v.w];
}

/// Linear interpolation between two 4D vectors.
pub fn lerp_vector4(a: Vector4<f32>, b: Vector4<f32>, t: f32) -> Vector4<f32> {
    return a + (b - a) * t;
}

/// Linear interpolation between two 2D vectors.
pub fn lerp_vector2(a: Vector2<f32>, b: Vector2<f32>, t: f32) -> Vector2<f32> {
    return a + (b - a) * t;
}

/// Points on a circle of radius `r` in the z = 0 plane, `segments + 1` of them so that
/// the last one closes the loop.
pub fn circle_points(r: f32, segments: usize) -> Vec<Vector3<f32>> {
    let step = 2.0 * std::f32::consts::PI / segments.max(1) as f32;
    return (0..=segments)
        .map(|i| {
            let angle = step * (i % segments.max(1)) as f32;
            vector![r * angle.cos(), r * angle.sin(), 0.0]
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_w_keeps_w() {
        let v = divide_by_w(vector![2.0, 4.0, -6.0, 2.0]);
        assert_eq!(v, vector![1.0, 2.0, -3.0, 2.0]);
    }

    #[test]
    fn circle_closes() {
        let points = circle_points(1.0, 6);
        assert_eq!(points.len(), 7);
        assert_eq!(points[0], points[6]);
    }
}
