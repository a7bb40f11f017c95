//! Scene graph for the ring view
//!
//! The scene owns the camera, the renderer and the ring group. The group always holds the
//! core sphere; everything else in it belongs to the most recent [`Scene::rebuild`].

use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::viz::camera::PerspectiveCamera;
use crate::viz::color::{rgb, Color, BASE_PALETTE, RAIL};
use crate::viz::context::{GeometryId, GraphicsError, Material, MaterialId};
use crate::viz::geometry::Geometry;
use crate::viz::raster::{FrameBuffer, Light, SceneRenderer};
use crate::viz::rings::{RingConfig, RingDescriptor};

const CAMERA_FOV: f32 = 36.0;
const CAMERA_NEAR: f32 = 0.1;
const CAMERA_FAR: f32 = 100.0;
const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 0.95, 3.4);
const GROUP_HEIGHT: f32 = 0.02;
const CORE_RADIUS: f32 = 0.42;

fn ring_tilt() -> f32 {
    PI / 2.1
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z
    pub rotation: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_z(self.rotation.z)
    }
}

/// What a mesh in the ring group stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshRole {
    Core,
    Track,
    Usage,
    Rail,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub role: MeshRole,
    pub geometry: GeometryId,
    pub material: MaterialId,
    pub transform: Transform,
}

impl Mesh {
    /// Ring meshes are replaced on every rebuild; the core never is.
    pub fn is_ring(&self) -> bool {
        self.role != MeshRole::Core
    }
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub transform: Transform,
    pub children: Vec<Mesh>,
}

pub struct Scene {
    camera: PerspectiveCamera,
    renderer: SceneRenderer,
    ring_group: Group,
    lights: Vec<Light>,
    config: RingConfig,
    disposed: bool,
}

impl Scene {
    pub fn new(config: RingConfig) -> Result<Self, GraphicsError> {
        let mut camera = PerspectiveCamera::new(CAMERA_FOV, 1.0, CAMERA_NEAR, CAMERA_FAR);
        camera.look_at(CAMERA_POSITION, Vec3::ZERO);

        let mut scene = Self {
            camera,
            renderer: SceneRenderer::new(),
            ring_group: Group {
                transform: Transform::at(Vec3::new(0.0, GROUP_HEIGHT, 0.0)),
                children: Vec::new(),
            },
            lights: default_lights(),
            config,
            disposed: false,
        };

        let core_material = Material::opaque(Color::new(1.0, 1.0, 1.0))
            .with_emissive(rgb(BASE_PALETTE[0]), 0.18);
        let core = scene.build_mesh(
            MeshRole::Core,
            Geometry::sphere(CORE_RADIUS, 40, 40),
            core_material,
            Transform::default(),
        )?;
        scene.ring_group.children.push(core);

        Ok(scene)
    }

    /// Replace every ring mesh with meshes for `descriptors`. The core is left alone.
    pub fn rebuild(&mut self, descriptors: &[RingDescriptor]) -> Result<(), GraphicsError> {
        if self.disposed {
            return Ok(());
        }

        let released = self.clear_rings();
        for descriptor in descriptors {
            self.add_ring(descriptor)?;
        }

        tracing::debug!(
            released,
            rings = descriptors.len(),
            meshes = self.ring_mesh_count(),
            "rebuilt ring group"
        );
        Ok(())
    }

    fn clear_rings(&mut self) -> usize {
        let (rings, kept): (Vec<Mesh>, Vec<Mesh>) = std::mem::take(&mut self.ring_group.children)
            .into_iter()
            .partition(Mesh::is_ring);
        self.ring_group.children = kept;

        let context = self.renderer.context_mut();
        for mesh in &rings {
            context.release_geometry(mesh.geometry);
            context.release_material(mesh.material);
        }
        rings.len()
    }

    fn add_ring(&mut self, ring: &RingDescriptor) -> Result<(), GraphicsError> {
        let tilt = ring_tilt();
        let radial = self.config.radial_segments;
        let tubular = self.config.tubular_segments;
        let placement = Transform::at(Vec3::new(0.0, ring.vertical_offset, 0.0)).rotated(tilt, 0.0, 0.0);

        let track = self.build_mesh(
            MeshRole::Track,
            Geometry::torus(ring.radius, ring.thickness, radial, tubular, TAU),
            Material::opaque(ring.base_color)
                .with_emissive(Color::new(0.043, 0.063, 0.11), 0.25)
                .with_opacity(0.5),
            placement,
        )?;
        self.ring_group.children.push(track);

        let usage = self.build_mesh(
            MeshRole::Usage,
            Geometry::torus(ring.radius, ring.thickness, radial, tubular, ring.arc_radians),
            Material::opaque(ring.usage_color).with_emissive(Color::new(0.047, 0.165, 0.153), 0.9),
            placement.rotated(tilt, 0.0, -FRAC_PI_2),
        )?;
        self.ring_group.children.push(usage);

        let rail_offset = ring.vertical_offset - ring.thickness * 0.35;
        let rail = self.build_mesh(
            MeshRole::Rail,
            Geometry::torus(ring.radius, ring.thickness * 0.25, radial, tubular, TAU),
            Material::opaque(rgb(RAIL))
                .with_emissive(Color::new(0.039, 0.059, 0.11), 0.2)
                .with_opacity(0.65),
            Transform::at(Vec3::new(0.0, rail_offset, 0.0)).rotated(tilt, 0.0, 0.0),
        )?;
        self.ring_group.children.push(rail);

        Ok(())
    }

    fn build_mesh(
        &mut self,
        role: MeshRole,
        geometry: Geometry,
        material: Material,
        transform: Transform,
    ) -> Result<Mesh, GraphicsError> {
        let context = self.renderer.context_mut();
        let geometry = context.create_geometry(geometry)?;
        let material = match context.create_material(material) {
            Ok(material) => material,
            Err(err) => {
                context.release_geometry(geometry);
                return Err(err);
            }
        };

        Ok(Mesh {
            role,
            geometry,
            material,
            transform,
        })
    }

    /// Match the camera and framebuffer to a viewport of `width` × `height` pixels.
    ///
    /// A zero dimension keeps the previous aspect so the projection stays finite.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.camera.set_aspect(width as f32 / height as f32);
            self.camera.update_projection_matrix();
        }
        self.renderer.set_size(width, height);
    }

    pub fn set_group_rotation(&mut self, x: f32, y: f32) {
        self.ring_group.transform.rotation = Vec3::new(x, y, 0.0);
    }

    pub fn render(&mut self) -> Result<(), GraphicsError> {
        if self.disposed {
            return Ok(());
        }
        self.renderer
            .render(&self.ring_group, &self.lights, &self.camera)
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.ring_group.children.clear();
        self.renderer.dispose();
        self.disposed = true;
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.renderer.framebuffer()
    }

    pub fn ring_group(&self) -> &Group {
        &self.ring_group
    }

    pub fn ring_mesh_count(&self) -> usize {
        self.ring_group.children.iter().filter(|m| m.is_ring()).count()
    }

    /// Live `(geometries, materials)` in the graphics context.
    pub fn live_resources(&self) -> (usize, usize) {
        let context = self.renderer.context();
        (context.live_geometries(), context.live_materials())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn default_lights() -> Vec<Light> {
    vec![
        Light::Ambient {
            color: Color::new(1.0, 1.0, 1.0),
            intensity: 0.5,
        },
        Light::Directional {
            color: rgb(BASE_PALETTE[1]),
            intensity: 0.95,
            direction: Vec3::new(3.2, 3.6, 3.2),
        },
        Light::Directional {
            color: Color::new(1.0, 1.0, 1.0),
            intensity: 0.7,
            direction: Vec3::new(-3.0, 2.4, 2.6),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viz::rings::{layout_rings, reading};
    use pretty_assertions::assert_eq;

    fn descriptors(count: usize) -> Vec<RingDescriptor> {
        let readings: Vec<_> = (0..count).map(|i| reading(i as f64 * 20.0)).collect();
        layout_rings(&readings, &RingConfig::default())
    }

    fn scene() -> Scene {
        let config = RingConfig {
            tubular_segments: 48,
            radial_segments: 6,
            ..RingConfig::default()
        };
        Scene::new(config).unwrap()
    }

    #[test]
    fn new_scene_holds_only_the_core() {
        let scene = scene();
        assert_eq!(scene.ring_group().children.len(), 1);
        assert_eq!(scene.ring_mesh_count(), 0);
        assert_eq!(scene.live_resources(), (1, 1));
    }

    #[test]
    fn rebuild_creates_three_meshes_per_ring() {
        for count in [0, 1, 5] {
            let mut scene = scene();
            scene.rebuild(&descriptors(count)).unwrap();
            assert_eq!(scene.ring_mesh_count(), 3 * count);
            assert_eq!(scene.live_resources(), (1 + 3 * count, 1 + 3 * count));
        }
    }

    #[test]
    fn repeated_rebuilds_leave_no_orphans() {
        let mut scene = scene();
        scene.rebuild(&descriptors(5)).unwrap();
        scene.rebuild(&descriptors(2)).unwrap();

        assert_eq!(scene.ring_mesh_count(), 6);
        assert_eq!(scene.live_resources(), (7, 7));
        let core = scene
            .ring_group()
            .children
            .iter()
            .filter(|m| m.role == MeshRole::Core)
            .count();
        assert_eq!(core, 1);
    }

    #[test]
    fn empty_rebuild_then_render_shows_only_the_core() {
        let mut scene = scene();
        scene.resize(120, 80);
        scene.rebuild(&descriptors(3)).unwrap();
        scene.rebuild(&[]).unwrap();
        scene.render().unwrap();

        assert_eq!(scene.ring_mesh_count(), 0);
        assert_eq!(scene.live_resources(), (1, 1));
        assert!(scene.framebuffer().covered() > 0);
    }

    #[test]
    fn rings_render_around_the_core() {
        let mut scene = scene();
        scene.resize(120, 80);
        scene.render().unwrap();
        let core_only = scene.framebuffer().covered();

        scene.rebuild(&descriptors(3)).unwrap();
        scene.render().unwrap();
        assert!(scene.framebuffer().covered() > core_only);
    }

    #[test]
    fn invalid_descriptor_is_an_error() {
        let mut scene = scene();
        let mut broken = descriptors(1);
        broken[0].radius = f32::NAN;

        let err = scene.rebuild(&broken).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidGeometry(_)));
    }

    #[test]
    fn dispose_is_idempotent_and_stops_rebuilds() {
        let mut scene = scene();
        scene.rebuild(&descriptors(2)).unwrap();

        scene.dispose();
        scene.dispose();

        assert!(scene.is_disposed());
        assert_eq!(scene.live_resources(), (0, 0));
        scene.rebuild(&descriptors(4)).unwrap();
        scene.render().unwrap();
        assert_eq!(scene.ring_mesh_count(), 0);
    }
}
