// Analytic shapes used for the region of interest, cells, sources and detectors.
// Only z-aligned cylinders and spheres are modelled, so the shape set is a closed enum.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Directions shorter than this in the xy-plane are treated as parallel to the z-axis.
const AXIAL_TOLERANCE: f64 = 1e-12;

/// A half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vector3<f64>,
    direction: Vector3<f64>,
}

impl Ray {
    /// Builds a ray, normalizing `direction`. A zero direction is a caller error.
    pub fn new(origin: Vector3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn origin(&self) -> Vector3<f64> {
        self.origin
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.direction
    }

    pub fn point_at(&self, t: f64) -> Vector3<f64> {
        self.origin + self.direction * t
    }
}

/// Cylinder aligned with +z, described by the center of its lower face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub base_center: Vector3<f64>,
    pub height: f64,
    pub radius: f64,
}

impl Cylinder {
    pub fn new(base_center: Vector3<f64>, height: f64, radius: f64) -> Self {
        Self {
            base_center,
            height,
            radius,
        }
    }

    /// Strict interior test; points on the surface are outside.
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        let dz = point.z - self.base_center.z;
        if dz <= 0.0 || dz >= self.height {
            return false;
        }
        let dx = point.x - self.base_center.x;
        let dy = point.y - self.base_center.y;
        dx * dx + dy * dy < self.radius * self.radius
    }

    /// Distance from an interior ray origin to the lateral surface.
    ///
    /// The circle-line problem is solved in the xy-plane and scaled back to the
    /// 3-D path length. A ray parallel to the axis never reaches the lateral
    /// surface, so the distance to the end cap it points at is returned instead.
    pub fn intersection_length(&self, ray: &Ray) -> f64 {
        let dir = ray.direction();
        let origin = ray.origin();
        let planar_len = (dir.x * dir.x + dir.y * dir.y).sqrt();
        if planar_len < AXIAL_TOLERANCE {
            return if dir.z > 0.0 {
                (self.base_center.z + self.height - origin.z) / dir.z
            } else {
                (self.base_center.z - origin.z) / dir.z
            };
        }

        let diff_x = self.base_center.x - origin.x;
        let diff_y = self.base_center.y - origin.y;
        let ux = dir.x / planar_len;
        let uy = dir.y / planar_len;
        let c = diff_x * ux + diff_y * uy;
        let diff_sq = diff_x * diff_x + diff_y * diff_y;
        (c + (self.radius * self.radius + c * c - diff_sq).sqrt()) / planar_len
    }

    pub fn volume(&self) -> f64 {
        PI * self.radius * self.radius * self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vector3<f64>,
    pub radius: f64,
}

impl Sphere {
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (point - self.center).norm() < self.radius
    }

    /// Perpendicular distance from the center to the line through `origin` along `direction`.
    pub fn distance_to_line(&self, origin: &Vector3<f64>, direction: &Vector3<f64>) -> f64 {
        let delta = self.center - origin;
        let dir_sq = direction.norm_squared();
        let along = delta.dot(direction);
        let perp_sq = (delta.norm_squared() * dir_sq - along * along).max(0.0);
        perp_sq.sqrt() / dir_sq.sqrt()
    }

    /// Chord length of the ray through the sphere, or 0 when the sphere is
    /// behind the origin or missed entirely.
    pub fn intersection_length(&self, ray: &Ray) -> f64 {
        let to_center = self.center - ray.origin();
        if ray.direction().dot(&to_center) <= 0.0 {
            return 0.0;
        }
        let d = self.distance_to_line(&ray.origin(), &ray.direction());
        if d >= self.radius {
            return 0.0;
        }
        2.0 * (self.radius * self.radius - d * d).sqrt()
    }

    /// Forward distance to the far side of the sphere, 0 when the ray misses it.
    pub fn distance_to_exit(&self, ray: &Ray) -> f64 {
        let oc = ray.origin() - self.center;
        let b = ray.direction().dot(&oc);
        let disc = b * b - (oc.norm_squared() - self.radius * self.radius);
        if disc < 0.0 {
            return 0.0;
        }
        (-b + disc.sqrt()).max(0.0)
    }

    pub fn volume(&self) -> f64 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    pub fn surface_area(&self) -> f64 {
        4.0 * PI * self.radius * self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Cylinder(Cylinder),
    Sphere(Sphere),
}

impl Shape {
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        match self {
            Shape::Cylinder(c) => c.contains(point),
            Shape::Sphere(s) => s.contains(point),
        }
    }

    /// Cylinder: distance to exit from an interior origin. Sphere: chord length.
    pub fn intersection_length(&self, ray: &Ray) -> f64 {
        match self {
            Shape::Cylinder(c) => c.intersection_length(ray),
            Shape::Sphere(s) => s.intersection_length(ray),
        }
    }

    /// Path length from an interior origin to the boundary.
    pub fn distance_to_exit(&self, ray: &Ray) -> f64 {
        match self {
            Shape::Cylinder(c) => c.intersection_length(ray),
            Shape::Sphere(s) => s.distance_to_exit(ray),
        }
    }
}

impl From<Cylinder> for Shape {
    fn from(c: Cylinder) -> Self {
        Shape::Cylinder(c)
    }
}

impl From<Sphere> for Shape {
    fn from(s: Sphere) -> Self {
        Shape::Sphere(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ray_direction_is_normalized() {
        let dirs = [
            Vector3::new(3.0, 4.0, 0.0),
            Vector3::new(-1e-3, 2e-3, 5e-4),
            Vector3::new(0.0, 0.0, -12.0),
            Vector3::new(1e6, -1e6, 3.0),
        ];
        for d in dirs {
            let ray = Ray::new(Vector3::zeros(), d);
            assert_abs_diff_eq!(ray.direction().norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cylinder_contains() {
        let cyl = Cylinder::new(Vector3::new(0.0, 0.0, 1.0), 3.0, 1.0);
        assert!(cyl.contains(&Vector3::new(0.0, 0.0, 2.0)));
        assert!(cyl.contains(&Vector3::new(0.5, 0.5, 3.9)));
        assert!(!cyl.contains(&Vector3::new(0.0, 0.0, 1.0)));
        assert!(!cyl.contains(&Vector3::new(0.0, 0.0, 4.0)));
        assert!(!cyl.contains(&Vector3::new(1.0, 0.0, 2.0)));
        assert!(!cyl.contains(&Vector3::new(0.8, 0.8, 2.0)));
        assert!(!cyl.contains(&Vector3::new(0.0, 0.0, 0.5)));
    }

    #[test]
    fn test_cylinder_intersection_horizontal() {
        let cyl = Cylinder::new(Vector3::new(0.0, 0.0, 1.0), 3.0, 1.0);
        let ray = Ray::new(Vector3::new(0.0, 0.0, 1.5), Vector3::new(3.0, 3.0, 0.0));
        assert_abs_diff_eq!(cyl.intersection_length(&ray), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_intersection_oblique() {
        let cyl = Cylinder::new(Vector3::new(0.0, 0.0, 1.0), 3.0, 1.0);
        let dir = Vector3::new(3.0, 3.0, -1.0);
        let ray = Ray::new(Vector3::new(0.0, 0.0, 2.5), dir);
        let t = 1.0 / (2.0f64.sqrt() * 3.0);
        assert_abs_diff_eq!(cyl.intersection_length(&ray), t * dir.norm(), epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_intersection_off_axis_origin() {
        let cyl = Cylinder::new(Vector3::new(25.0, 25.0, 0.0), 52.0, 5.0);
        let ray = Ray::new(Vector3::new(28.0, 25.0, 10.0), Vector3::new(-1.0, 0.0, 0.0));
        assert_abs_diff_eq!(cyl.intersection_length(&ray), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cylinder_axial_ray_hits_cap() {
        let cyl = Cylinder::new(Vector3::new(0.0, 0.0, 0.0), 10.0, 1.0);
        let up = Ray::new(Vector3::new(0.1, 0.0, 4.0), Vector3::new(0.0, 0.0, 1.0));
        let down = Ray::new(Vector3::new(0.1, 0.0, 4.0), Vector3::new(0.0, 0.0, -1.0));
        assert_abs_diff_eq!(cyl.intersection_length(&up), 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cyl.intersection_length(&down), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_contains() {
        let s = Sphere::new(Vector3::new(1.0, 1.0, 1.0), 2.0);
        assert!(s.contains(&Vector3::new(1.0, 1.0, 1.0)));
        assert!(s.contains(&Vector3::new(2.5, 1.0, 1.0)));
        assert!(!s.contains(&Vector3::new(3.0, 1.0, 1.0)));
        assert!(!s.contains(&Vector3::new(3.0, 3.0, 3.0)));
    }

    #[test]
    fn test_sphere_chord_through_center() {
        let s = Sphere::new(Vector3::new(100.0, 100.0, 10.0), 1.0);
        let origin = Vector3::new(25.0, 25.0, 10.0);
        let ray = Ray::new(origin, s.center - origin);
        assert_abs_diff_eq!(s.intersection_length(&ray), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_missed_and_behind() {
        let s = Sphere::new(Vector3::new(100.0, 100.0, 10.0), 1.0);
        let origin = Vector3::new(25.0, 25.0, 10.0);
        let miss = Ray::new(origin, Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(s.intersection_length(&miss), 0.0);
        let behind = Ray::new(origin, origin - s.center);
        assert_eq!(s.intersection_length(&behind), 0.0);
    }

    #[test]
    fn test_sphere_offset_chord() {
        let s = Sphere::new(Vector3::new(10.0, 0.0, 0.0), 2.0);
        let ray = Ray::new(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(s.intersection_length(&ray), 2.0 * 3.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_distance_to_exit_from_center() {
        let s = Sphere::new(Vector3::new(0.0, 0.0, 0.0), 3.0);
        let ray = Ray::new(Vector3::zeros(), Vector3::new(0.0, 1.0, 1.0));
        assert_abs_diff_eq!(s.distance_to_exit(&ray), 3.0, epsilon = 1e-12);
        let shape = Shape::from(s);
        assert_abs_diff_eq!(shape.distance_to_exit(&ray), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sphere_measures() {
        let s = Sphere::new(Vector3::zeros(), 2.54);
        assert_abs_diff_eq!(s.volume(), 4.0 / 3.0 * PI * 2.54f64.powi(3), epsilon = 1e-12);
        assert_abs_diff_eq!(s.surface_area(), 4.0 * PI * 2.54 * 2.54, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_dispatch() {
        let cyl: Shape = Cylinder::new(Vector3::zeros(), 2.0, 1.0).into();
        assert!(cyl.contains(&Vector3::new(0.0, 0.0, 1.0)));
        let ray = Ray::new(Vector3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(cyl.intersection_length(&ray), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_deserializes_from_json() {
        let json = r#"{"type":"sphere","center":[1.0,2.0,3.0],"radius":2.54}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        match shape {
            Shape::Sphere(s) => {
                assert_eq!(s.center, Vector3::new(1.0, 2.0, 3.0));
                assert_eq!(s.radius, 2.54);
            }
            _ => panic!("expected a sphere"),
        }
    }
}
