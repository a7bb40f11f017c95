//! Vertex generation for ring and core meshes

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Point cloud with per-vertex normals. The rasterizer splats vertices, so no index buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl Geometry {
    /// Torus in the XY plane around the Z axis, swept from angle 0 to `arc`.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32, arc: f32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(1);
        let capacity = ((radial_segments + 1) * (tubular_segments + 1)) as usize;

        let mut geometry = Self {
            positions: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
        };

        for j in 0..=radial_segments {
            let v = j as f32 / radial_segments as f32 * TAU;
            for i in 0..=tubular_segments {
                let u = i as f32 / tubular_segments as f32 * arc;

                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);

                geometry.positions.push(position);
                geometry.normals.push((position - center).normalize_or_zero());
            }
        }

        geometry
    }

    /// UV sphere centered on the origin.
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);
        let capacity = ((width_segments + 1) * (height_segments + 1)) as usize;

        let mut geometry = Self {
            positions: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
        };

        for iy in 0..=height_segments {
            let theta = iy as f32 / height_segments as f32 * PI;
            for ix in 0..=width_segments {
                let phi = ix as f32 / width_segments as f32 * TAU;
                let normal = Vec3::new(
                    -phi.cos() * theta.sin(),
                    theta.cos(),
                    phi.sin() * theta.sin(),
                );
                geometry.positions.push(normal * radius);
                geometry.normals.push(normal);
            }
        }

        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|p| p.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torus_vertices_lie_on_the_tube() {
        let torus = Geometry::torus(1.5, 0.1, 8, 32, TAU);

        assert_eq!(torus.vertex_count(), 9 * 33);
        for p in &torus.positions {
            let ring_distance = (p.x * p.x + p.y * p.y).sqrt() - 1.5;
            let tube_distance = (ring_distance * ring_distance + p.z * p.z).sqrt();
            assert!((tube_distance - 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn partial_arc_stays_within_sweep() {
        let arc = std::f32::consts::FRAC_PI_2;
        let torus = Geometry::torus(2.0, 0.05, 4, 16, arc);

        for p in &torus.positions {
            let angle = p.y.atan2(p.x);
            assert!(angle >= -1e-4 && angle <= arc + 1e-4, "angle {angle}");
        }
    }

    #[test]
    fn sphere_normals_are_unit_length() {
        let sphere = Geometry::sphere(0.42, 12, 8);
        for (p, n) in sphere.positions.iter().zip(&sphere.normals) {
            assert!((n.length() - 1.0).abs() < 1e-4);
            assert!((p.length() - 0.42).abs() < 1e-4);
        }
    }

    #[test]
    fn non_finite_input_is_detected() {
        assert!(!Geometry::torus(f32::NAN, 0.1, 4, 4, TAU).is_finite());
    }
}
