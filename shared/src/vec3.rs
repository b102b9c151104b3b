/// 3D vector and quaternion utilities for poses in the shared space.
/// Everything is `f32` because that is what travels on the wire.

#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Shorthand constructor
pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Dot product
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Cross product
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    Vec3 {
        x: a.y * b.z - a.z * b.y,
        y: a.z * b.x - a.x * b.z,
        z: a.x * b.y - a.y * b.x,
    }
}

/// Vector length
pub fn length(v: Vec3) -> f32 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Normalize vector to unit length. Degenerate input yields the zero vector.
pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len < 1e-10 {
        return Vec3::ZERO;
    }
    Vec3::new(v.x / len, v.y / len, v.z / len)
}

/// Scale vector by scalar
pub fn scale(v: Vec3, s: f32) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

/// Add two vectors
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Euclidean distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    length(sub(a, b))
}

/// Rotation quaternion, stored in wire order (x, y, z, w).
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn from_array(a: [f32; 4]) -> Self {
        Self::new(a[0], a[1], a[2], a[3])
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }

    /// Rotation of `angle` radians around a unit `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let half = angle * 0.5;
        let s = half.sin();
        Self::new(axis.x * s, axis.y * s, axis.z * s, half.cos())
    }

    /// Rotate a vector by this quaternion.
    pub fn rotate(self, v: Vec3) -> Vec3 {
        // v' = v + 2w(q x v) + 2(q x (q x v))
        let q = vec3(self.x, self.y, self.z);
        let t = scale(cross(q, v), 2.0);
        add(add(v, scale(t, self.w)), cross(q, t))
    }

    /// Heading around +Y, measured so that yaw 0 looks down -Z.
    pub fn yaw(self) -> f32 {
        let forward = self.rotate(vec3(0.0, 0.0, -1.0));
        (-forward.x).atan2(-forward.z)
    }
}

/// Rotation around +Y only, keeping the heading of `q`.
pub fn yaw_only(q: Quat) -> Quat {
    Quat::from_axis_angle(vec3(0.0, 1.0, 0.0), q.yaw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            (actual.x - expected.x).abs() < 1e-5
                && (actual.y - expected.y).abs() < 1e-5
                && (actual.z - expected.z).abs() < 1e-5,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn cross_x_and_y_is_z() {
        assert_vec3_close(
            cross(vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0)),
            vec3(0.0, 0.0, 1.0),
        );
    }

    #[test]
    fn length_of_3_4_0_is_5() {
        assert_eq!(length(vec3(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn normalize_returns_unit_vector() {
        let v = normalize(vec3(3.0, 4.0, 0.0));
        assert_close(length(v), 1.0);
        assert_vec3_close(v, vec3(0.6, 0.8, 0.0));
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(normalize(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn distance_between_points() {
        assert_close(distance(vec3(1.0, 1.0, 1.0), vec3(1.0, 1.0, 3.0)), 2.0);
    }

    #[test]
    fn identity_rotation_does_nothing() {
        let v = vec3(1.0, 2.0, 3.0);
        assert_vec3_close(Quat::IDENTITY.rotate(v), v);
    }

    #[test]
    fn rotate_x_around_y_by_90_gives_neg_z() {
        let q = Quat::from_axis_angle(vec3(0.0, 1.0, 0.0), PI / 2.0);
        assert_vec3_close(q.rotate(vec3(1.0, 0.0, 0.0)), vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn yaw_of_identity_is_zero() {
        assert_close(Quat::IDENTITY.yaw(), 0.0);
    }

    #[test]
    fn yaw_only_drops_pitch() {
        let turned = Quat::from_axis_angle(vec3(0.0, 1.0, 0.0), 0.7);
        let pitch = Quat::from_axis_angle(vec3(1.0, 0.0, 0.0), -0.4);
        // turn first, then look down
        let combined = mul(turned, pitch);
        assert_close(combined.yaw(), 0.7);
        let flat = yaw_only(combined).rotate(vec3(0.0, 0.0, -1.0));
        assert_close(flat.y, 0.0);
    }

    fn mul(a: Quat, b: Quat) -> Quat {
        Quat::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}
