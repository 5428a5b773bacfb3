//! Vector, rotation and projection routines used by math nodes.
//!
//! Everything here is a pure function over `f32`. Rotations are unit
//! quaternions; Euler angles are in degrees and compose as Y·X·Z
//! (roll first, then pitch, then yaw).

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Vertical field of view of a perspective camera, in degrees.
pub const PERSPECTIVE_FOV: f32 = 60.0;
/// Distance of the near point produced by screen-to-world.
pub const NEAR_DISTANCE: f32 = 1.0;
/// Distance of the far point produced by screen-to-world.
pub const FAR_DISTANCE: f32 = 400.0;

const EPSILON: f32 = 1e-6;

pub fn deg_to_rad(deg: f32) -> f32 {
    deg * (std::f32::consts::PI / 180.0)
}

pub fn rad_to_deg(rad: f32) -> f32 {
    rad * (180.0 / std::f32::consts::PI)
}

// ─── Vec3 ──────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Vec3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len < EPSILON {
            Vec3::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ─── Rotation ──────────────────────────────────────────────────────

/// Unit quaternion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Rot {
    fn default() -> Self {
        Rot::IDENTITY
    }
}

impl Rot {
    pub const IDENTITY: Rot = Rot {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `deg` degrees around `axis`. A zero axis gives identity.
    pub fn axis_angle(axis: Vec3, deg: f32) -> Rot {
        let n = axis.normalize();
        if n == Vec3::ZERO {
            return Rot::IDENTITY;
        }
        let half = deg_to_rad(deg) * 0.5;
        let s = half.sin();
        Rot::new(n.x * s, n.y * s, n.z * s, half.cos())
    }

    /// Euler angles in degrees, applied Z, then X, then Y.
    pub fn from_euler_deg(angles: Vec3) -> Rot {
        let rx = Rot::axis_angle(Vec3::X, angles.x);
        let ry = Rot::axis_angle(Vec3::Y, angles.y);
        let rz = Rot::axis_angle(Vec3::Z, angles.z);
        ry * rx * rz
    }

    /// Inverse of [`Rot::from_euler_deg`]; pitch in [-90, 90].
    pub fn to_euler_deg(self) -> Vec3 {
        let m = self.matrix();
        let sin_x = (-m[1][2]).clamp(-1.0, 1.0);
        let x = sin_x.asin();
        if sin_x.abs() > 1.0 - EPSILON {
            // Gimbal lock: fold roll into yaw.
            let y = (-m[2][0]).atan2(m[0][0]);
            return Vec3::new(rad_to_deg(x), rad_to_deg(y), 0.0);
        }
        let y = m[0][2].atan2(m[2][2]);
        let z = m[1][0].atan2(m[1][1]);
        Vec3::new(rad_to_deg(x), rad_to_deg(y), rad_to_deg(z))
    }

    /// Rotation whose +Z axis points along `forward` and whose +Y axis
    /// leans toward `up`.
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Rot {
        let f = forward.normalize();
        if f == Vec3::ZERO {
            return Rot::IDENTITY;
        }
        let mut r = up.cross(f).normalize();
        if r == Vec3::ZERO {
            // `up` is parallel to `forward`; any perpendicular will do.
            let helper = if f.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
            r = helper.cross(f).normalize();
        }
        let u = f.cross(r);
        Rot::from_matrix([[r.x, u.x, f.x], [r.y, u.y, f.y], [r.z, u.z, f.z]])
    }

    pub fn inverse(self) -> Rot {
        let norm = self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w;
        if norm < EPSILON {
            return Rot::IDENTITY;
        }
        let inv = 1.0 / norm;
        Rot::new(-self.x * inv, -self.y * inv, -self.z * inv, self.w * inv)
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let q = Vec3::new(self.x, self.y, self.z);
        let t = q.cross(v) * 2.0;
        v + t * self.w + q.cross(t)
    }

    /// Spherical interpolation along the shortest arc.
    pub fn slerp(self, other: Rot, t: f32) -> Rot {
        let mut b = other;
        let mut dot = self.x * b.x + self.y * b.y + self.z * b.z + self.w * b.w;
        if dot < 0.0 {
            b = Rot::new(-b.x, -b.y, -b.z, -b.w);
            dot = -dot;
        }
        let (wa, wb) = if dot > 0.9995 {
            (1.0 - t, t)
        } else {
            let theta = dot.clamp(-1.0, 1.0).acos();
            let sin = theta.sin();
            (((1.0 - t) * theta).sin() / sin, (t * theta).sin() / sin)
        };
        Rot::new(
            self.x * wa + b.x * wb,
            self.y * wa + b.y * wb,
            self.z * wa + b.z * wb,
            self.w * wa + b.w * wb,
        )
        .normalize()
    }

    pub fn normalize(self) -> Rot {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len < EPSILON {
            return Rot::IDENTITY;
        }
        Rot::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite() && self.w.is_finite()
    }

    /// Rotation matrix, row-major.
    fn matrix(self) -> [[f32; 3]; 3] {
        let Rot { x, y, z, w } = self;
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - w * z),
                2.0 * (x * z + w * y),
            ],
            [
                2.0 * (x * y + w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - w * x),
            ],
            [
                2.0 * (x * z - w * y),
                2.0 * (y * z + w * x),
                1.0 - 2.0 * (x * x + y * y),
            ],
        ]
    }

    fn from_matrix(m: [[f32; 3]; 3]) -> Rot {
        let trace = m[0][0] + m[1][1] + m[2][2];
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Rot::new(
                (m[2][1] - m[1][2]) / s,
                (m[0][2] - m[2][0]) / s,
                (m[1][0] - m[0][1]) / s,
                0.25 * s,
            )
        } else if m[0][0] > m[1][1] && m[0][0] > m[2][2] {
            let s = (1.0 + m[0][0] - m[1][1] - m[2][2]).sqrt() * 2.0;
            Rot::new(
                0.25 * s,
                (m[0][1] + m[1][0]) / s,
                (m[0][2] + m[2][0]) / s,
                (m[2][1] - m[1][2]) / s,
            )
        } else if m[1][1] > m[2][2] {
            let s = (1.0 + m[1][1] - m[0][0] - m[2][2]).sqrt() * 2.0;
            Rot::new(
                (m[0][1] + m[1][0]) / s,
                0.25 * s,
                (m[1][2] + m[2][1]) / s,
                (m[0][2] - m[2][0]) / s,
            )
        } else {
            let s = (1.0 + m[2][2] - m[0][0] - m[1][1]).sqrt() * 2.0;
            Rot::new(
                (m[0][2] + m[2][0]) / s,
                (m[1][2] + m[2][1]) / s,
                0.25 * s,
                (m[1][0] - m[0][1]) / s,
            )
        };
        q.normalize()
    }
}

impl Mul for Rot {
    type Output = Rot;
    fn mul(self, b: Rot) -> Rot {
        let a = self;
        Rot::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}

impl std::fmt::Display for Rot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let e = self.to_euler_deg();
        write!(f, "rot({}, {}, {})", e.x, e.y, e.z)
    }
}

// ─── Camera Projection ─────────────────────────────────────────────

/// The host camera, as needed to map between screen and world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Rot,
    /// Orthographic half-height in world units (ignored in perspective).
    pub range: f32,
    pub perspective: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -10.0),
            rotation: Rot::IDENTITY,
            range: 10.0,
            perspective: true,
        }
    }
}

impl Camera {
    /// Pixels per world unit at distance 1 (perspective) or overall
    /// (orthographic).
    fn scale(&self, screen_height: f32) -> f32 {
        if self.perspective {
            (screen_height * 0.5) / (deg_to_rad(PERSPECTIVE_FOV) * 0.5).tan()
        } else if self.range.abs() < EPSILON {
            0.0
        } else {
            (screen_height * 0.5) / self.range
        }
    }

    /// Project a world point to screen pixels (origin bottom-left).
    pub fn world_to_screen(&self, screen: (f32, f32), point: Vec3) -> (f32, f32) {
        let local = self.rotation.inverse().rotate(point - self.position);
        let scale = self.scale(screen.1);
        let depth = if self.perspective {
            local.z.max(EPSILON)
        } else {
            1.0
        };
        (
            screen.0 * 0.5 + local.x * scale / depth,
            screen.1 * 0.5 + local.y * scale / depth,
        )
    }

    /// Unproject a screen pixel to a near and a far world point.
    pub fn screen_to_world(&self, screen: (f32, f32), pixel: (f32, f32)) -> (Vec3, Vec3) {
        let scale = self.scale(screen.1);
        if scale == 0.0 {
            return (self.position, self.position);
        }
        let dx = (pixel.0 - screen.0 * 0.5) / scale;
        let dy = (pixel.1 - screen.1 * 0.5) / scale;
        let (near, far) = if self.perspective {
            let dir = Vec3::new(dx, dy, 1.0);
            (dir * NEAR_DISTANCE, dir * FAR_DISTANCE)
        } else {
            (
                Vec3::new(dx, dy, NEAR_DISTANCE),
                Vec3::new(dx, dy, FAR_DISTANCE),
            )
        };
        (
            self.position + self.rotation.rotate(near),
            self.position + self.rotation.rotate(far),
        )
    }
}
