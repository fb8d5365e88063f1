//! Machine tuning and presets
//!
//! Every constant the simulation reads lives in [`MachineConfig`]. A config is
//! validated once at construction and never changes while a session runs.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Rect;
use crate::consts::BLINK_INTERVAL;

/// Construction-time configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} is inverted: min {min} exceeds max {max}")]
    InvertedRect {
        field: &'static str,
        min: Vec2,
        max: Vec2,
    },

    #[error("grab depth {depth} is outside the claw's reach (0, {max_extension}]")]
    GrabDepthOutOfReach { depth: f32, max_extension: f32 },

    #[error("invalid machine config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How the descend button drives the claw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DescentMode {
    /// One press runs a full drop-and-return cycle
    #[default]
    Toggle,
    /// Claw lowers while the button is held and rises on release
    Hold,
}

/// Claw-to-toy contact test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GrabTest {
    /// Independent per-axis threshold, checked on every descending tick
    BoxThreshold { range: f32 },
    /// Horizontal distance within `radius`, checked once the claw is at least
    /// `min_extension` deep
    EuclideanRadius { radius: f32, min_extension: f32 },
}

/// Where a released toy counts as a win
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WinRule {
    /// Toy falls freely and wins when it passes through the hole window.
    /// `center`/`half_extents` are (x, y) in the vertical plane.
    FallThrough { center: Vec2, half_extents: Vec2 },
    /// Decided at release: the drop point (clamped to `drop_area`) is tested
    /// against `hole`. Both rects are (x, z).
    DropZone { hole: Rect, drop_area: Rect },
}

/// What collecting a prize does to the rest of the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResetPolicy {
    /// Power off, claw to rest, unwon toys back to their start positions
    #[default]
    FullReset,
    /// Power off only; toys stay where they are
    PowerOff,
}

/// A toy placed at session start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToySpawn {
    pub name: String,
    pub position: Vec3,
}

impl ToySpawn {
    pub fn new(name: &str, position: Vec3) -> Self {
        Self {
            name: name.to_string(),
            position,
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Claw travel limits, (x, z)
    pub bounds: Rect,
    /// World height of the claw tip when fully retracted
    pub rest_height: f32,
    /// Deepest the claw can reach below `rest_height`
    pub max_extension: f32,
    /// Horizontal speed for continuous movement (units/s)
    pub move_speed: f32,
    /// Distance covered by one discrete nudge
    pub nudge_step: f32,
    /// Vertical claw speed, both directions (units/s)
    pub drop_speed: f32,
    /// Downward acceleration on falling toys (units/s²)
    pub gravity: f32,
    /// Carried toy hangs this far below the claw tip
    pub tip_offset: f32,
    /// Height toys settle at on the playfield floor
    pub floor_height: f32,
    pub grab: GrabTest,
    pub win: WinRule,
    /// Prize compartment where won toys end up
    pub display_position: Vec3,
    /// Lamp blink half-period (seconds)
    #[serde(default = "default_blink_interval")]
    pub blink_interval: f32,
    #[serde(default)]
    pub descent: DescentMode,
    #[serde(default)]
    pub reset: ResetPolicy,
    pub toys: Vec<ToySpawn>,
}

fn default_blink_interval() -> f32 {
    BLINK_INTERVAL
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self::arcade_2d()
    }
}

impl MachineConfig {
    /// Flat arcade cabinet: A/D movement, S toggles a drop cycle, toys fall
    /// through a hole into the prize shelf, collecting resets everything.
    pub fn arcade_2d() -> Self {
        Self {
            bounds: Rect::new(Vec2::new(-0.35, 0.0), Vec2::new(0.35, 0.0)),
            rest_height: 0.25,
            max_extension: 0.40,
            move_speed: 0.50,
            nudge_step: 0.05,
            drop_speed: 0.35,
            gravity: 1.5,
            tip_offset: 0.10,
            floor_height: -0.15,
            grab: GrabTest::BoxThreshold { range: 0.20 },
            win: WinRule::FallThrough {
                center: Vec2::new(0.37, -0.30),
                half_extents: Vec2::new(0.10, 0.08),
            },
            display_position: Vec3::new(0.32, -0.50, 0.0),
            blink_interval: BLINK_INTERVAL,
            descent: DescentMode::Toggle,
            reset: ResetPolicy::FullReset,
            toys: vec![
                ToySpawn::new("toy1", Vec3::new(-0.25, -0.15, 0.0)),
                ToySpawn::new("toy2", Vec3::new(0.22, -0.15, 0.0)),
            ],
        }
    }

    /// Full cabinet: WASD nudges, hold Space to lower, drop point decides the
    /// win, collecting the prize switches the machine off.
    pub fn cabinet_3d() -> Self {
        Self {
            bounds: Rect::new(Vec2::new(-0.13, -0.13), Vec2::new(0.13, 0.13)),
            rest_height: 0.05,
            max_extension: 0.178,
            move_speed: 0.30,
            nudge_step: 0.014,
            drop_speed: 0.24,
            gravity: 1.5,
            tip_offset: 0.032,
            floor_height: -0.16,
            grab: GrabTest::EuclideanRadius {
                radius: 0.12,
                min_extension: 0.172,
            },
            win: WinRule::DropZone {
                hole: Rect::new(Vec2::new(-0.12, -0.02), Vec2::new(0.02, 0.12)),
                drop_area: Rect::new(Vec2::new(-0.1, -0.1), Vec2::new(0.1, 0.1)),
            },
            display_position: Vec3::new(-0.15, -0.41, 0.18),
            blink_interval: BLINK_INTERVAL,
            descent: DescentMode::Hold,
            reset: ResetPolicy::PowerOff,
            toys: vec![
                ToySpawn::new("bear", Vec3::new(-0.03, -0.12, 0.0)),
                ToySpawn::new("rabbit", Vec3::new(0.06, -0.12, 0.02)),
            ],
        }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every numeric constraint the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_extension", self.max_extension)?;
        positive("move_speed", self.move_speed)?;
        positive("nudge_step", self.nudge_step)?;
        positive("drop_speed", self.drop_speed)?;
        positive("gravity", self.gravity)?;
        positive("blink_interval", self.blink_interval)?;
        non_negative("tip_offset", self.tip_offset)?;
        finite("rest_height", self.rest_height)?;
        finite("floor_height", self.floor_height)?;
        for v in self.display_position.to_array() {
            finite("display_position", v)?;
        }
        rect("bounds", &self.bounds)?;

        match self.grab {
            GrabTest::BoxThreshold { range } => positive("grab.range", range)?,
            GrabTest::EuclideanRadius {
                radius,
                min_extension,
            } => {
                positive("grab.radius", radius)?;
                if !(min_extension > 0.0 && min_extension <= self.max_extension) {
                    return Err(ConfigError::GrabDepthOutOfReach {
                        depth: min_extension,
                        max_extension: self.max_extension,
                    });
                }
            }
        }

        match self.win {
            WinRule::FallThrough {
                center,
                half_extents,
            } => {
                finite("win.center", center.x)?;
                finite("win.center", center.y)?;
                positive("win.half_extents", half_extents.x)?;
                positive("win.half_extents", half_extents.y)?;
            }
            WinRule::DropZone { hole, drop_area } => {
                rect("win.hole", &hole)?;
                rect("win.drop_area", &drop_area)?;
            }
        }

        for toy in &self.toys {
            for v in toy.position.to_array() {
                finite("toys.position", v)?;
            }
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn rect(field: &'static str, r: &Rect) -> Result<(), ConfigError> {
    for v in [r.min.x, r.min.y, r.max.x, r.max.y] {
        finite(field, v)?;
    }
    if r.is_inverted() {
        return Err(ConfigError::InvertedRect {
            field,
            min: r.min,
            max: r.max,
        });
    }
    Ok(())
}
