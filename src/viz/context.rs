//! Graphics resource arena owned by the scene renderer
//!
//! Every geometry and material the scene creates lives here behind a handle. Releasing a
//! handle frees the resource; releasing the whole context invalidates every handle and makes
//! further allocation fail.

use std::collections::HashMap;
use thiserror::Error;

use crate::viz::color::Color;
use crate::viz::geometry::Geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(u64);

/// Failures of the graphics context. Not recoverable by the caller.
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("graphics context has been released")]
    ContextLost,

    #[error("geometry rejected: {0}")]
    InvalidGeometry(String),

    #[error("unknown geometry handle {0:?}")]
    UnknownGeometry(GeometryId),

    #[error("unknown material handle {0:?}")]
    UnknownMaterial(MaterialId),
}

/// Surface appearance of a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub opacity: f32,
}

impl Material {
    pub fn opaque(color: Color) -> Self {
        Self {
            color,
            emissive: Color::new(0.0, 0.0, 0.0),
            emissive_intensity: 0.0,
            opacity: 1.0,
        }
    }

    pub fn with_emissive(mut self, emissive: Color, intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

#[derive(Debug, Default)]
pub struct GraphicsContext {
    geometries: HashMap<GeometryId, Geometry>,
    materials: HashMap<MaterialId, Material>,
    next_handle: u64,
    released: bool,
}

impl GraphicsContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_live(&self) -> Result<(), GraphicsError> {
        if self.released {
            Err(GraphicsError::ContextLost)
        } else {
            Ok(())
        }
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn create_geometry(&mut self, geometry: Geometry) -> Result<GeometryId, GraphicsError> {
        self.ensure_live()?;
        if geometry.vertex_count() == 0 {
            return Err(GraphicsError::InvalidGeometry("no vertices".to_string()));
        }
        if !geometry.is_finite() {
            return Err(GraphicsError::InvalidGeometry(
                "non-finite vertex position".to_string(),
            ));
        }

        let id = GeometryId(self.next_handle());
        self.geometries.insert(id, geometry);
        Ok(id)
    }

    pub fn create_material(&mut self, material: Material) -> Result<MaterialId, GraphicsError> {
        self.ensure_live()?;
        let id = MaterialId(self.next_handle());
        self.materials.insert(id, material);
        Ok(id)
    }

    pub fn geometry(&self, id: GeometryId) -> Result<&Geometry, GraphicsError> {
        self.ensure_live()?;
        self.geometries
            .get(&id)
            .ok_or(GraphicsError::UnknownGeometry(id))
    }

    pub fn material(&self, id: MaterialId) -> Result<&Material, GraphicsError> {
        self.ensure_live()?;
        self.materials
            .get(&id)
            .ok_or(GraphicsError::UnknownMaterial(id))
    }

    /// Returns whether the handle was live.
    pub fn release_geometry(&mut self, id: GeometryId) -> bool {
        self.geometries.remove(&id).is_some()
    }

    pub fn release_material(&mut self, id: MaterialId) -> bool {
        self.materials.remove(&id).is_some()
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_materials(&self) -> usize {
        self.materials.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Drop every resource and refuse further allocation. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        tracing::debug!(
            geometries = self.geometries.len(),
            materials = self.materials.len(),
            "releasing graphics context"
        );
        self.geometries.clear();
        self.materials.clear();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn ring() -> Geometry {
        Geometry::torus(1.0, 0.1, 4, 8, TAU)
    }

    #[test]
    fn tracks_allocation_and_release() {
        let mut ctx = GraphicsContext::new();
        let geometry = ctx.create_geometry(ring()).unwrap();
        let material = ctx
            .create_material(Material::opaque(Color::new(1.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!((ctx.live_geometries(), ctx.live_materials()), (1, 1));

        assert!(ctx.release_geometry(geometry));
        assert!(ctx.release_material(material));
        assert!(!ctx.release_geometry(geometry));
        assert_eq!((ctx.live_geometries(), ctx.live_materials()), (0, 0));
        assert!(matches!(
            ctx.geometry(geometry),
            Err(GraphicsError::UnknownGeometry(_))
        ));
    }

    #[test]
    fn rejects_invalid_geometry() {
        let mut ctx = GraphicsContext::new();
        let err = ctx
            .create_geometry(Geometry::torus(f32::NAN, 0.1, 4, 8, TAU))
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidGeometry(_)));
        assert!(ctx.create_geometry(Geometry::default()).is_err());
    }

    #[test]
    fn released_context_refuses_allocation() {
        let mut ctx = GraphicsContext::new();
        ctx.create_geometry(ring()).unwrap();

        ctx.release();
        ctx.release();

        assert!(ctx.is_released());
        assert_eq!(ctx.live_geometries(), 0);
        assert!(matches!(
            ctx.create_geometry(ring()),
            Err(GraphicsError::ContextLost)
        ));
    }

    #[test]
    fn opacity_is_clamped() {
        let material = Material::opaque(Color::new(0.0, 0.0, 0.0)).with_opacity(3.0);
        assert_eq!(material.opacity, 1.0);
        assert!(!material.is_transparent());
    }
}
