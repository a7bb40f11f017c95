//! Software point-splat renderer
//!
//! Vertices are transformed, lit, and written into a depth-tested framebuffer sized in
//! pixels. Opaque meshes are drawn first; translucent ones blend over them without
//! writing depth.

use glam::{Mat3, Vec3};
use palette::{Clamp, LinSrgb, Mix, Srgb};

use crate::viz::camera::PerspectiveCamera;
use crate::viz::color::Color;
use crate::viz::context::{GraphicsContext, GraphicsError, Material};
use crate::viz::scene::Group;

/// Scene light sources
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: Color,
        intensity: f32,
    },
    /// Parallel light arriving from `direction` (pointing towards the light).
    Directional {
        color: Color,
        intensity: f32,
        direction: Vec3,
    },
}

#[derive(Debug, Clone, Copy)]
struct Pixel {
    color: LinSrgb,
    depth: f32,
}

/// Output buffer the terminal widget reads from
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Option<Pixel>>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let mut buffer = Self::default();
        buffer.set_size(width, height);
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![None; width as usize * height as usize];
    }

    pub fn clear(&mut self) {
        self.pixels.fill(None);
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    /// Depth-tested opaque write.
    pub fn plot(&mut self, x: u32, y: u32, depth: f32, color: LinSrgb) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let slot = &mut self.pixels[index];
        if slot.map_or(true, |p| depth < p.depth) {
            *slot = Some(Pixel { color, depth });
        }
    }

    /// Depth-tested blend that leaves the stored depth untouched.
    pub fn blend(&mut self, x: u32, y: u32, depth: f32, color: LinSrgb, opacity: f32) {
        let Some(index) = self.index(x, y) else {
            return;
        };
        let slot = &mut self.pixels[index];
        if let Some(pixel) = slot.as_mut() {
            if depth < pixel.depth {
                pixel.color = pixel.color.mix(color, opacity);
            }
            return;
        }
        *slot = Some(Pixel {
            color: LinSrgb::new(0.0, 0.0, 0.0).mix(color, opacity),
            depth: f32::INFINITY,
        });
    }

    pub fn covered(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }

    /// Covered pixels as `(x, y, color)`, row-major from the top-left corner.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        let width = self.width.max(1);
        self.pixels.iter().enumerate().filter_map(move |(i, pixel)| {
            pixel.map(|p| {
                let i = i as u32;
                (i % width, i / width, Srgb::from_linear(p.color.clamp()))
            })
        })
    }
}

/// Owns the graphics context and the framebuffer it draws into
#[derive(Debug, Default)]
pub struct SceneRenderer {
    context: GraphicsContext,
    framebuffer: FrameBuffer,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> &GraphicsContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut GraphicsContext {
        &mut self.context
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.framebuffer.set_size(width, height);
    }

    pub fn dispose(&mut self) {
        self.context.release();
        self.framebuffer.set_size(0, 0);
    }

    pub fn render(
        &mut self,
        group: &Group,
        lights: &[Light],
        camera: &PerspectiveCamera,
    ) -> Result<(), GraphicsError> {
        if self.context.is_released() {
            return Err(GraphicsError::ContextLost);
        }
        self.framebuffer.clear();
        if self.framebuffer.is_empty() {
            return Ok(());
        }

        let view_projection = camera.view_projection();
        let group_matrix = group.transform.matrix();
        let width = self.framebuffer.width() as f32;
        let height = self.framebuffer.height() as f32;

        for translucent_pass in [false, true] {
            for mesh in &group.children {
                let material = self.context.material(mesh.material)?;
                if material.is_transparent() != translucent_pass {
                    continue;
                }
                let geometry = self.context.geometry(mesh.geometry)?;

                let model = group_matrix * mesh.transform.matrix();
                let normal_matrix = Mat3::from_mat4(model);

                for (position, normal) in geometry.positions.iter().zip(&geometry.normals) {
                    let world = model.transform_point3(*position);
                    let normal = (normal_matrix * *normal).normalize_or_zero();
                    if normal.dot(camera.position - world) < 0.0 {
                        continue;
                    }

                    let clip = view_projection * world.extend(1.0);
                    if clip.w <= camera.near {
                        continue;
                    }
                    let ndc = clip.truncate() / clip.w;
                    if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || !(0.0..=1.0).contains(&ndc.z) {
                        continue;
                    }

                    let x = ((ndc.x + 1.0) * 0.5 * width).min(width - 1.0) as u32;
                    let y = ((1.0 - ndc.y) * 0.5 * height).min(height - 1.0) as u32;
                    let color = shade(material, normal, lights);

                    if translucent_pass {
                        self.framebuffer.blend(x, y, ndc.z, color, material.opacity);
                    } else {
                        self.framebuffer.plot(x, y, ndc.z, color);
                    }
                }
            }
        }

        Ok(())
    }
}

fn shade(material: &Material, normal: Vec3, lights: &[Light]) -> LinSrgb {
    let mut incoming = LinSrgb::new(0.0, 0.0, 0.0);
    for light in lights {
        let (color, strength) = match light {
            Light::Ambient { color, intensity } => (color, *intensity),
            Light::Directional {
                color,
                intensity,
                direction,
            } => (color, *intensity * normal.dot(direction.normalize_or_zero()).max(0.0)),
        };
        let color: LinSrgb = color.into_linear();
        incoming = incoming + color * strength;
    }

    let base: LinSrgb = material.color.into_linear();
    let emissive: LinSrgb = material.emissive.into_linear();
    base * incoming + emissive * material.emissive_intensity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_keeps_nearest_sample() {
        let mut buffer = FrameBuffer::new(4, 4);
        buffer.plot(1, 1, 0.8, LinSrgb::new(1.0, 0.0, 0.0));
        buffer.plot(1, 1, 0.2, LinSrgb::new(0.0, 1.0, 0.0));
        buffer.plot(1, 1, 0.5, LinSrgb::new(0.0, 0.0, 1.0));

        let (x, y, color) = buffer.iter().next().unwrap();
        assert_eq!((x, y), (1, 1));
        let color: Srgb<u8> = color.into_format();
        assert_eq!(color, Srgb::new(0, 255, 0));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.plot(5, 0, 0.1, LinSrgb::new(1.0, 1.0, 1.0));
        buffer.blend(0, 9, 0.1, LinSrgb::new(1.0, 1.0, 1.0), 0.5);
        assert_eq!(buffer.covered(), 0);
    }

    #[test]
    fn blend_respects_depth_and_does_not_write_it() {
        let mut buffer = FrameBuffer::new(1, 1);
        buffer.plot(0, 0, 0.5, LinSrgb::new(0.0, 0.0, 0.0));
        buffer.blend(0, 0, 0.9, LinSrgb::new(1.0, 1.0, 1.0), 0.5);
        let (_, _, behind) = buffer.iter().next().unwrap();
        assert_eq!(behind.into_format::<u8>(), Srgb::new(0, 0, 0));

        buffer.blend(0, 0, 0.1, LinSrgb::new(1.0, 1.0, 1.0), 0.5);
        buffer.plot(0, 0, 0.4, LinSrgb::new(1.0, 0.0, 0.0));
        let (_, _, front) = buffer.iter().next().unwrap();
        assert_eq!(front.into_format::<u8>(), Srgb::new(255, 0, 0));
    }

    #[test]
    fn resizing_clears_and_matches_dimensions() {
        let mut buffer = FrameBuffer::new(8, 6);
        buffer.plot(3, 3, 0.1, LinSrgb::new(1.0, 1.0, 1.0));
        buffer.set_size(4, 3);
        assert_eq!((buffer.width(), buffer.height()), (4, 3));
        assert_eq!(buffer.covered(), 0);
    }

    #[test]
    fn released_context_cannot_render() {
        let mut renderer = SceneRenderer::new();
        renderer.dispose();
        let camera = PerspectiveCamera::new(36.0, 1.0, 0.1, 100.0);
        let err = renderer
            .render(&Group::default(), &[], &camera)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::ContextLost));
    }
}
