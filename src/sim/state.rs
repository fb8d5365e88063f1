//! Machine state and core simulation types
//!
//! Everything a session needs lives in [`MachineState`]; there is no global
//! state. Behaviour is split across `claw`, `toys` and `session`.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::toys::ToyPhysics;
use crate::consts::REST_EPSILON;
use crate::tuning::{ConfigError, MachineConfig, ResetPolicy, ToySpawn};

/// Stable toy identifier (index order = iteration order)
pub type ToyId = u32;

/// Toy lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToyState {
    /// Sitting at its start position, never touched
    Resting,
    /// Hanging from the claw
    Carried,
    /// Released, falling under gravity
    Falling,
    /// Passed through the hole, falling toward the prize shelf
    WonFalling,
    /// Landed on the playfield floor, can be grabbed again
    FloorRest,
    /// In the prize compartment waiting for the player
    OnDisplay,
    /// Taken by the player; terminal
    Collected,
}

impl ToyState {
    /// States the claw can pick a toy up from
    #[inline]
    pub fn is_grabbable(self) -> bool {
        matches!(self, ToyState::Resting | ToyState::FloorRest)
    }
}

/// A prize toy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Toy {
    pub id: ToyId,
    pub name: String,
    pub pos: Vec3,
    pub start_pos: Vec3,
    pub vel_y: f32,
    pub state: ToyState,
    /// Sticky once set
    pub won: bool,
}

impl Toy {
    pub fn new(id: ToyId, spawn: &ToySpawn) -> Self {
        Self {
            id,
            name: spawn.name.clone(),
            pos: spawn.position,
            start_pos: spawn.position,
            vel_y: 0.0,
            state: ToyState::Resting,
            won: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state != ToyState::Collected
    }

    /// Put the toy back where the session started it
    pub fn return_to_start(&mut self) {
        self.pos = self.start_pos;
        self.vel_y = 0.0;
        self.state = ToyState::Resting;
    }
}

/// Claw motion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClawMode {
    #[default]
    AtRest,
    Descending,
    Ascending,
    /// Hold mode only: parked at full depth while the button stays down
    HoldingDescent,
}

/// The claw actuator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claw {
    /// (x, z) position, always inside the configured bounds
    pub horizontal: Vec2,
    /// Distance below the rest height, always in `[0, max_extension]`
    pub extension: f32,
    pub mode: ClawMode,
    /// Weak reference to the toy being carried
    pub carried: Option<ToyId>,
}

impl Claw {
    /// Claw parked at the center of its travel, fully retracted
    pub fn at_rest(config: &MachineConfig) -> Self {
        Self {
            horizontal: config.bounds.clamp(Vec2::ZERO),
            extension: 0.0,
            mode: ClawMode::AtRest,
            carried: None,
        }
    }

    /// World position of the claw tip
    pub fn tip(&self, config: &MachineConfig) -> Vec3 {
        Vec3::new(
            self.horizontal.x,
            config.rest_height - self.extension,
            self.horizontal.y,
        )
    }

    #[inline]
    pub fn is_retracted(&self) -> bool {
        self.mode == ClawMode::AtRest && self.extension <= REST_EPSILON
    }
}

/// Lamp state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LampMode {
    #[default]
    Off,
    Steady,
    /// Alternating green/red until the prize is collected
    Blinking { green: bool, timer: f32 },
}

/// Machine power, play gate and lamp
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub machine_on: bool,
    pub game_running: bool,
    pub lamp: LampMode,
}

/// Something that happened during a tick (for frontends and logging)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MachineEvent {
    PoweredOn,
    PoweredOff,
    LampToggled { on: bool },
    DescentStarted,
    ClawBottomedOut,
    Grabbed(ToyId),
    Released { toy: ToyId, position: Vec3 },
    ToyLanded(ToyId),
    ToyWon(ToyId),
    ToyDisplayed(ToyId),
    ToyCollected(ToyId),
    Reset(ResetPolicy),
}

/// Complete machine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineState {
    pub config: MachineConfig,
    pub claw: Claw,
    pub toys: ToyPhysics,
    pub session: Session,
    /// Ticks processed since construction
    pub time_ticks: u64,
    /// Events produced by the most recent tick
    #[serde(skip)]
    pub events: Vec<MachineEvent>,
}

impl MachineState {
    /// Validate the config and build a powered-off machine
    pub fn new(config: MachineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let claw = Claw::at_rest(&config);
        let toys = ToyPhysics::spawn(&config.toys);
        log::debug!("machine built with {} toys", toys.len());
        Ok(Self {
            config,
            claw,
            toys,
            session: Session::default(),
            time_ticks: 0,
            events: Vec::new(),
        })
    }

    /// Number of toys currently carried (0 or 1)
    pub fn carried_count(&self) -> usize {
        self.toys
            .iter()
            .filter(|t| t.state == ToyState::Carried)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_machine_is_off_and_resting() {
        let state = MachineState::new(MachineConfig::arcade_2d()).unwrap();
        assert!(!state.session.machine_on);
        assert!(!state.session.game_running);
        assert_eq!(state.session.lamp, LampMode::Off);
        assert_eq!(state.toys.len(), 2);
        assert!(state.toys.iter().all(|t| t.state == ToyState::Resting && !t.won));
        assert!(state.claw.is_retracted());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = MachineConfig::arcade_2d();
        config.move_speed = 0.0;
        assert!(MachineState::new(config).is_err());
    }

    #[test]
    fn test_claw_tip_follows_extension() {
        let config = MachineConfig::arcade_2d();
        let mut claw = Claw::at_rest(&config);
        claw.extension = 0.1;
        let tip = claw.tip(&config);
        assert!((tip.y - 0.15).abs() < 1e-6);
        assert_eq!(tip.z, 0.0);
    }

    #[test]
    fn test_toy_ids_follow_spawn_order() {
        let state = MachineState::new(MachineConfig::cabinet_3d()).unwrap();
        let names: Vec<_> = state.toys.iter().map(|t| (t.id, t.name.as_str())).collect();
        assert_eq!(names, vec![(0, "bear"), (1, "rabbit")]);
    }
}
