//! Claw Machine - an arcade prize-grabber simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (claw, toys, session/lamp, tick order)
//! - `platform`: Raw input translation into the simulation's vocabulary
//! - `tuning`: Data-driven machine configuration and presets

pub mod platform;
pub mod sim;
pub mod tuning;

pub use tuning::{ConfigError, MachineConfig};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Shared constants
pub mod consts {
    /// Default step used by the demo runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Lamp blink half-period in seconds
    pub const BLINK_INTERVAL: f32 = 0.5;
    /// Extensions closer than this to zero count as fully retracted
    pub const REST_EPSILON: f32 = 1e-4;
}

/// Axis-aligned rectangle in the horizontal plane
///
/// `x` maps to world X, `y` maps to world Z (or to world Y for
/// the vertical hole window of the 2D build).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Rectangle centered on `center` extending `half` each way
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Inclusive containment
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_inverted(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }
}
