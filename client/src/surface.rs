//! Pointer ray against interactive surfaces.
//!
//! Candidates are tested in priority order and the first acceptable hit
//! wins, even when a later candidate is geometrically closer. This mirrors
//! how the UI layers stack: the keyboard sits above the address bar, which
//! sits above the link grid.

use presence_shared::config::InteractionConfig;
use presence_shared::vec3::{add, cross, distance, dot, length, normalize, scale, sub, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize(direction),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        add(self.origin, scale(self.direction, t))
    }

    /// Point where the ray meets the plane, or None if it points away or
    /// runs parallel outside it.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<Vec3> {
        let denom = dot(plane.normal, self.direction);
        if denom.abs() < 1e-8 {
            if plane.distance_to_point(self.origin).abs() < 1e-6 {
                return Some(self.origin);
            }
            return None;
        }
        let t = -(dot(self.origin, plane.normal) + plane.constant) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.at(t))
    }
}

/// Plane `dot(normal, p) + constant = 0` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normalize(normal);
        Self {
            normal,
            constant: -dot(point, normal),
        }
    }

    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        dot(self.normal, p) + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        distance(self.start, self.end)
    }

    /// Closest point on the segment (not the infinite line) to `p`.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let d = sub(self.end, self.start);
        let len_sq = dot(d, d);
        if len_sq < 1e-12 {
            return self.start;
        }
        let t = (dot(sub(p, self.start), d) / len_sq).clamp(0.0, 1.0);
        add(self.start, scale(d, t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Keyboard,
    AddressBar,
    GridRow(usize),
}

/// A rectangular interactive panel in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub plane: Plane,
    /// Top edge, left to right
    pub top: Segment,
    /// Left edge, top to bottom
    pub left: Segment,
}

impl Surface {
    pub fn new(kind: SurfaceKind, top: Segment, left: Segment) -> Self {
        let normal = cross(sub(top.end, top.start), sub(left.end, left.start));
        Self {
            kind,
            plane: Plane::from_normal_and_point(normal, top.start),
            top,
            left,
        }
    }

    /// Build a surface from three of its corners.
    pub fn from_corners(kind: SurfaceKind, top_left: Vec3, top_right: Vec3, bottom_left: Vec3) -> Self {
        Self::new(
            kind,
            Segment::new(top_left, top_right),
            Segment::new(top_left, bottom_left),
        )
    }

    /// Normalized (x, y) of a point on the plane, measured from the top-left
    /// corner along the top and left edges.
    pub fn normalized_coords(&self, point: Vec3) -> (f32, f32) {
        let width = self.top.length();
        let height = self.left.length();
        if width <= 0.0 || height <= 0.0 {
            return (0.0, 0.0);
        }
        let on_top = self.top.closest_point(point);
        let on_left = self.left.closest_point(point);
        (
            distance(on_top, self.top.start) / width,
            distance(on_left, self.left.start) / height,
        )
    }

    fn is_degenerate(&self) -> bool {
        length(self.plane.normal) < 0.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub kind: SurfaceKind,
    pub x: f32,
    pub y: f32,
    pub point: Vec3,
    pub distance: f32,
}

/// First acceptable hit in candidate order.
pub fn resolve(ray: &Ray, candidates: &[Surface], config: &InteractionConfig) -> Option<Hit> {
    candidates.iter().find_map(|surface| test_surface(ray, surface, config))
}

fn test_surface(ray: &Ray, surface: &Surface, config: &InteractionConfig) -> Option<Hit> {
    if surface.is_degenerate() {
        return None;
    }
    let point = ray.intersect_plane(&surface.plane)?;
    let (x, y) = surface.normalized_coords(point);
    let distance = distance(ray.origin, point);
    let in_range = |v: f32| v > 0.0 && v <= config.max_surface_coord;
    if in_range(x) && in_range(y) && distance < config.ray_distance {
        Some(Hit {
            kind: surface.kind,
            x,
            y,
            point,
            distance,
        })
    } else {
        None
    }
}
