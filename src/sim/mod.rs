//! Deterministic simulation module
//!
//! All machine logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only (autopilot)
//! - Stable iteration order (by toy ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod claw;
pub mod collision;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod toys;

pub use autopilot::Autopilot;
pub use claw::{ClawCommand, ClawOutcome};
pub use session::LeverAction;
pub use snapshot::{ClawPose, LampColor, Snapshot, ToyPose};
pub use state::{
    Claw, ClawMode, LampMode, MachineEvent, MachineState, Session, Toy, ToyId, ToyState,
};
pub use tick::{Action, PointerHit, TickInput, tick};
pub use toys::ToyPhysics;
