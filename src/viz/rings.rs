//! Volume readings → concentric ring descriptors

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::integrations::api::VolumeReading;
use crate::viz::color::{clamp_percent, color_for, rgb, Color, TRACK};

/// Shared ring geometry constants, configurable under `[rings]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub base_radius: f32,
    pub radius_step: f32,
    pub thickness: f32,
    pub stack_step: f32,
    /// Smallest arc drawn, so an idle volume still shows a sliver
    pub minimum_arc: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            base_radius: 1.25,
            radius_step: 0.3,
            thickness: 0.09,
            stack_step: 0.18,
            minimum_arc: 0.02,
            tubular_segments: 280,
            radial_segments: 12,
        }
    }
}

/// Everything the scene needs to build one volume's ring
#[derive(Debug, Clone, PartialEq)]
pub struct RingDescriptor {
    pub index: usize,
    pub radius: f32,
    pub thickness: f32,
    pub arc_radians: f32,
    pub vertical_offset: f32,
    pub base_color: Color,
    pub usage_color: Color,
}

/// Lay out one ring per reading, innermost first, stack centered on the origin.
pub fn layout_rings(readings: &[VolumeReading], config: &RingConfig) -> Vec<RingDescriptor> {
    let count = readings.len();
    let center_offset = count.saturating_sub(1) as f32 * config.stack_step / 2.0;

    readings
        .iter()
        .enumerate()
        .map(|(index, reading)| {
            let percent = clamp_percent(reading.percent);
            RingDescriptor {
                index,
                radius: config.base_radius + index as f32 * config.radius_step,
                thickness: config.thickness,
                arc_radians: arc_for(percent, config.minimum_arc),
                vertical_offset: index as f32 * config.stack_step - center_offset,
                base_color: rgb(TRACK),
                usage_color: color_for(percent, index),
            }
        })
        .collect()
}

fn arc_for(percent: f64, minimum_arc: f32) -> f32 {
    ((percent / 100.0) as f32 * TAU).max(minimum_arc)
}

#[cfg(test)]
pub(crate) fn reading(percent: f64) -> VolumeReading {
    VolumeReading {
        device: "/dev/test".to_string(),
        mountpoint: "/".to_string(),
        filesystem_type: "ext4".to_string(),
        total_bytes: 100,
        used_bytes: percent as u64,
        free: 100u64.saturating_sub(percent as u64),
        percent,
        read_bytes: None,
        write_bytes: None,
    }
}
