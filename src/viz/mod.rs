//! 3D volume ring visualization
//!
//! Readings are laid out as concentric rings, built into a scene, and redrawn every frame
//! into a pixel framebuffer the dashboard paints with braille dots.

pub mod camera;
pub mod color;
pub mod context;
pub mod frame_loop;
pub mod geometry;
pub mod raster;
pub mod rings;
pub mod scene;

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::events::Event;
use crate::integrations::api::VolumeReading;
use context::GraphicsError;
use frame_loop::{FrameLoop, IdleMotion};
use raster::FrameBuffer;
use rings::{layout_rings, RingConfig};
use scene::Scene;

/// The scene plus the loop that animates it. Created once, disposed once.
pub struct Visualization {
    scene: Scene,
    motion: IdleMotion,
    frame_loop: Option<FrameLoop>,
    config: RingConfig,
}

impl Visualization {
    pub fn new(config: RingConfig) -> Result<Self, GraphicsError> {
        Ok(Self {
            scene: Scene::new(config.clone())?,
            motion: IdleMotion::new(Instant::now()),
            frame_loop: None,
            config,
        })
    }

    /// Begin posting frame events. Restarting replaces the running loop.
    pub fn start(&mut self, period: Duration, tx: mpsc::UnboundedSender<Event>) {
        if self.scene.is_disposed() {
            return;
        }
        if let Some(mut running) = self.frame_loop.take() {
            running.stop();
        }
        tracing::info!(period_ms = period.as_millis() as u64, "starting frame loop");
        self.frame_loop = Some(FrameLoop::start(period, tx));
    }

    /// Lay out `readings` and replace the ring meshes with the result.
    pub fn update_rings(&mut self, readings: &[VolumeReading]) -> Result<(), GraphicsError> {
        let descriptors = layout_rings(readings, &self.config);
        self.scene.rebuild(&descriptors)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let fb = self.scene.framebuffer();
        if fb.width() == width && fb.height() == height {
            return;
        }
        tracing::debug!(width, height, "resizing viewport");
        self.scene.resize(width, height);
    }

    /// Advance the idle motion and draw one frame.
    pub fn tick(&mut self, now: Instant) -> Result<(), GraphicsError> {
        self.motion.advance(now);
        self.scene
            .set_group_rotation(self.motion.tilt_x, self.motion.rotation_y);
        self.scene.render()
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        self.scene.framebuffer()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn is_animating(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(FrameLoop::is_running)
    }

    /// Stop the frame loop and release every graphics resource. Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut running) = self.frame_loop.take() {
            running.stop();
        }
        if !self.scene.is_disposed() {
            tracing::info!("disposing visualization");
            self.scene.dispose();
        }
    }
}

impl Drop for Visualization {
    fn drop(&mut self) {
        self.dispose();
    }
}
