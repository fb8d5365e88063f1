//! Read-only view of the machine for frontends
//!
//! Rendering and audio live outside this crate; they consume a
//! [`Snapshot`] per frame and never mutate the simulation.

use glam::Vec3;
use serde::Serialize;

use super::state::{ClawMode, LampMode, MachineState, ToyId, ToyState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LampColor {
    Off,
    Steady,
    Green,
    Red,
}

impl From<LampMode> for LampColor {
    fn from(mode: LampMode) -> Self {
        match mode {
            LampMode::Off => LampColor::Off,
            LampMode::Steady => LampColor::Steady,
            LampMode::Blinking { green: true, .. } => LampColor::Green,
            LampMode::Blinking { green: false, .. } => LampColor::Red,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClawPose {
    /// Claw tip in world space
    pub position: Vec3,
    pub extension: f32,
    pub mode: ClawMode,
    /// Prongs drawn closed (carrying, or the machine is idle)
    pub closed: bool,
    pub carrying: Option<ToyId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToyPose {
    pub id: ToyId,
    pub name: String,
    pub position: Vec3,
    pub state: ToyState,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub claw: ClawPose,
    pub toys: Vec<ToyPose>,
    pub lamp: LampColor,
    pub machine_on: bool,
}

impl MachineState {
    pub fn snapshot(&self) -> Snapshot {
        let claw = ClawPose {
            position: self.claw.tip(&self.config),
            extension: self.claw.extension,
            mode: self.claw.mode,
            closed: !self.session.game_running || self.claw.carried.is_some(),
            carrying: self.claw.carried,
        };
        let toys = self
            .toys
            .iter()
            .map(|t| ToyPose {
                id: t.id,
                name: t.name.clone(),
                position: t.pos,
                state: t.state,
                visible: t.is_visible(),
            })
            .collect();
        Snapshot {
            claw,
            toys,
            lamp: self.session.lamp.into(),
            machine_on: self.session.machine_on,
        }
    }
}
