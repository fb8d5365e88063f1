//! Claw actuator
//!
//! Horizontal steering, the descend/ascend cycle in both descent modes,
//! grab detection and release.

use glam::Vec2;

use super::collision::find_grab_target;
use super::state::{Claw, ClawMode, Toy, ToyId};
use crate::tuning::{DescentMode, MachineConfig};

/// Per-tick claw command, already reduced from the frame's input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClawCommand {
    /// Continuous axis, each component in [-1, 1]
    pub move_axis: Vec2,
    /// Sum of discrete nudges this tick, in steps
    pub nudge: Vec2,
    /// Descend button went down this tick (consumed once)
    pub descend_pressed: bool,
    /// Descend button is currently down (hold mode)
    pub descend_held: bool,
}

/// What the claw did this tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClawOutcome {
    pub descent_started: bool,
    pub bottomed_out: bool,
    pub grabbed: Option<ToyId>,
    pub released: Option<ToyId>,
}

impl Claw {
    /// Advance the claw by `dt`. Does nothing while input is gated off.
    pub fn tick(
        &mut self,
        config: &MachineConfig,
        cmd: &ClawCommand,
        enabled: bool,
        toys: &[Toy],
        dt: f32,
    ) -> ClawOutcome {
        let mut out = ClawOutcome::default();
        if !enabled {
            return out;
        }

        // Horizontal travel is locked for the whole drop cycle
        if self.mode == ClawMode::AtRest {
            self.steer(config, cmd, dt);
        }

        match config.descent {
            DescentMode::Toggle => self.tick_toggle(config, cmd, toys, dt, &mut out),
            DescentMode::Hold => self.tick_hold(config, cmd, toys, dt, &mut out),
        }

        out
    }

    fn steer(&mut self, config: &MachineConfig, cmd: &ClawCommand, dt: f32) {
        let axis = cmd.move_axis.clamp(Vec2::splat(-1.0), Vec2::ONE);
        let delta = axis * config.move_speed * dt + cmd.nudge * config.nudge_step;
        self.horizontal = config.bounds.clamp(self.horizontal + delta);
    }

    fn tick_toggle(
        &mut self,
        config: &MachineConfig,
        cmd: &ClawCommand,
        toys: &[Toy],
        dt: f32,
        out: &mut ClawOutcome,
    ) {
        // Presses only count with the claw all the way up
        if cmd.descend_pressed && self.is_retracted() {
            if let Some(id) = self.carried.take() {
                out.released = Some(id);
                return;
            }
            self.mode = ClawMode::Descending;
            out.descent_started = true;
        }

        match self.mode {
            ClawMode::Descending => self.descend(config, toys, dt, false, out),
            ClawMode::Ascending => self.ascend(config, dt),
            ClawMode::AtRest | ClawMode::HoldingDescent => {}
        }
    }

    fn tick_hold(
        &mut self,
        config: &MachineConfig,
        cmd: &ClawCommand,
        toys: &[Toy],
        dt: f32,
        out: &mut ClawOutcome,
    ) {
        if let Some(id) = self.carried {
            if cmd.descend_pressed {
                self.carried = None;
                out.released = Some(id);
            }
            // While carrying the claw always rises
            if self.mode != ClawMode::AtRest {
                self.ascend(config, dt);
            }
            return;
        }

        if cmd.descend_held {
            if self.mode == ClawMode::AtRest {
                out.descent_started = true;
            }
            self.descend(config, toys, dt, true, out);
        } else if self.mode != ClawMode::AtRest {
            self.ascend(config, dt);
        }
    }

    fn descend(
        &mut self,
        config: &MachineConfig,
        toys: &[Toy],
        dt: f32,
        park_at_bottom: bool,
        out: &mut ClawOutcome,
    ) {
        self.extension = (self.extension + config.drop_speed * dt).min(config.max_extension);

        let tip = self.tip(config);
        if let Some(id) = find_grab_target(&config.grab, tip, self.extension, toys) {
            log::debug!("claw grabbed toy {id} at extension {:.3}", self.extension);
            self.carried = Some(id);
            self.mode = ClawMode::Ascending;
            out.grabbed = Some(id);
            return;
        }

        if self.extension >= config.max_extension {
            if park_at_bottom {
                if self.mode != ClawMode::HoldingDescent {
                    out.bottomed_out = true;
                }
                self.mode = ClawMode::HoldingDescent;
            } else {
                out.bottomed_out = true;
                self.mode = ClawMode::Ascending;
            }
        } else {
            self.mode = ClawMode::Descending;
        }
    }

    fn ascend(&mut self, config: &MachineConfig, dt: f32) {
        self.extension = (self.extension - config.drop_speed * dt).max(0.0);
        self.mode = if self.extension <= 0.0 {
            ClawMode::AtRest
        } else {
            ClawMode::Ascending
        };
    }

    /// Pull the claw straight up, dropping whatever it held.
    /// Returns the id of the toy that was being carried.
    pub fn retract(&mut self) -> Option<ToyId> {
        self.extension = 0.0;
        self.mode = ClawMode::AtRest;
        self.carried.take()
    }
}
