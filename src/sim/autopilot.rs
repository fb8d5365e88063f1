//! Demo player that drives the machine on its own
//!
//! Produces a [`TickInput`] per frame from the current state, the same way a
//! frontend would from raw input. Seeded, so a demo run is reproducible.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::{ClawMode, MachineState};
use super::tick::{Action, PointerHit, TickInput};
use crate::tuning::{DescentMode, WinRule};

/// How far off a toy's center the autopilot aims
const AIM_JITTER: f32 = 0.02;
/// Chance of carrying a prize to the hole rather than dropping it anywhere
const AIM_FOR_HOLE: f64 = 0.75;
const ARRIVE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Plan {
    /// Choose the next toy
    Pick,
    /// Steer over `target`, then drop
    Approach { target: Vec2 },
    /// Drop cycle in progress
    Lowering,
    /// Hold mode: button let go, waiting for the claw to come up
    Raising,
    /// Carrying a toy to `target`
    Carry { target: Vec2 },
}

pub struct Autopilot {
    rng: Pcg32,
    plan: Plan,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            plan: Plan::Pick,
        }
    }

    /// Input for the next tick of length `dt`
    pub fn next_input(&mut self, state: &MachineState, dt: f32) -> TickInput {
        let session = &state.session;
        if !session.machine_on {
            self.plan = Plan::Pick;
            return pointer(PointerHit::CoinSlot);
        }
        if session.is_blinking() {
            return pointer(PointerHit::DisplayCompartment);
        }
        if !session.input_enabled() {
            // Prize still on its way to the shelf
            return TickInput::default();
        }

        let claw = &state.claw;
        let hold = state.config.descent == DescentMode::Hold;

        if claw.carried.is_some() {
            if !claw.is_retracted() {
                return TickInput::default();
            }
            let target = match self.plan {
                Plan::Carry { target } => target,
                _ => {
                    let target = self.drop_target(state);
                    log::debug!("autopilot carrying prize to {target}");
                    self.plan = Plan::Carry { target };
                    target
                }
            };
            return match self.steer(state, target, dt) {
                Some(input) => input,
                None => {
                    self.plan = Plan::Pick;
                    TickInput {
                        actions: vec![Action::Descend],
                        ..Default::default()
                    }
                }
            };
        }

        if matches!(self.plan, Plan::Carry { .. }) {
            self.plan = Plan::Pick;
        }

        match self.plan {
            Plan::Pick | Plan::Carry { .. } => {
                let target = self.grab_target(state);
                self.plan = Plan::Approach { target };
                TickInput::default()
            }
            Plan::Approach { target } => match self.steer(state, target, dt) {
                Some(input) => input,
                None => {
                    self.plan = Plan::Lowering;
                    TickInput {
                        descend_held: hold,
                        actions: vec![Action::Descend],
                        ..Default::default()
                    }
                }
            },
            Plan::Lowering => {
                if hold && claw.mode == ClawMode::HoldingDescent {
                    self.plan = Plan::Raising;
                    return TickInput::default();
                }
                if claw.is_retracted() && !hold {
                    self.plan = Plan::Pick;
                    return TickInput::default();
                }
                TickInput {
                    descend_held: hold,
                    ..Default::default()
                }
            }
            Plan::Raising => {
                if claw.is_retracted() {
                    self.plan = Plan::Pick;
                }
                TickInput::default()
            }
        }
    }

    /// Axis input moving the claw toward `target`, or `None` once it is there
    fn steer(&self, state: &MachineState, target: Vec2, dt: f32) -> Option<TickInput> {
        let delta = target - state.claw.horizontal;
        if delta.length() < ARRIVE_EPSILON {
            return None;
        }
        let per_tick = state.config.move_speed * dt;
        Some(TickInput {
            move_axis: (delta / per_tick).clamp(Vec2::splat(-1.0), Vec2::ONE),
            ..Default::default()
        })
    }

    fn grab_target(&mut self, state: &MachineState) -> Vec2 {
        let bounds = state.config.bounds;
        let candidates: Vec<Vec2> = state
            .toys
            .iter()
            .filter(|t| t.state.is_grabbable() && !t.won)
            .map(|t| Vec2::new(t.pos.x, t.pos.z))
            .collect();
        let aim = if candidates.is_empty() {
            self.random_point(state)
        } else {
            let i = self.rng.random_range(0..candidates.len());
            let jitter = Vec2::new(
                self.rng.random_range(-AIM_JITTER..=AIM_JITTER),
                self.rng.random_range(-AIM_JITTER..=AIM_JITTER),
            );
            candidates[i] + jitter
        };
        bounds.clamp(aim)
    }

    fn drop_target(&mut self, state: &MachineState) -> Vec2 {
        let config = &state.config;
        if !self.rng.random_bool(AIM_FOR_HOLE) {
            return self.random_point(state);
        }
        let hole = match config.win {
            WinRule::FallThrough { center, .. } => Vec2::new(center.x, 0.0),
            WinRule::DropZone { hole, .. } => hole.center(),
        };
        config.bounds.clamp(hole)
    }

    fn random_point(&mut self, state: &MachineState) -> Vec2 {
        let b = state.config.bounds;
        Vec2::new(
            lerp(b.min.x, b.max.x, self.rng.random::<f32>()),
            lerp(b.min.y, b.max.y, self.rng.random::<f32>()),
        )
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn pointer(hit: PointerHit) -> TickInput {
    TickInput {
        actions: vec![Action::Pointer(hit)],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::state::MachineEvent;
    use crate::sim::tick::tick;
    use crate::tuning::MachineConfig;

    fn run(config: MachineConfig, seed: u64, seconds: f32) -> (MachineState, Vec<MachineEvent>) {
        let mut state = MachineState::new(config).unwrap();
        let mut pilot = Autopilot::new(seed);
        let mut events = Vec::new();
        for _ in 0..(seconds / SIM_DT) as usize {
            let input = pilot.next_input(&state, SIM_DT);
            tick(&mut state, &input, SIM_DT);
            events.extend(state.events.iter().cloned());
        }
        (state, events)
    }

    #[test]
    fn test_inserts_coin_first() {
        let state = MachineState::new(MachineConfig::arcade_2d()).unwrap();
        let mut pilot = Autopilot::new(1);
        let input = pilot.next_input(&state, SIM_DT);
        assert_eq!(input.actions, vec![Action::Pointer(PointerHit::CoinSlot)]);
    }

    #[test]
    fn test_same_seed_same_run() {
        let (a, ea) = run(MachineConfig::arcade_2d(), 42, 30.0);
        let (b, eb) = run(MachineConfig::arcade_2d(), 42, 30.0);
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(ea, eb);
    }

    #[test]
    fn test_arcade_demo_grabs_toys() {
        let (_, events) = run(MachineConfig::arcade_2d(), 7, 60.0);
        assert!(events.iter().any(|e| matches!(e, MachineEvent::Grabbed(_))));
        assert!(events.iter().any(|e| matches!(e, MachineEvent::Released { .. })));
    }

    #[test]
    fn test_cabinet_demo_grabs_toys() {
        let (_, events) = run(MachineConfig::cabinet_3d(), 7, 60.0);
        assert!(events.iter().any(|e| matches!(e, MachineEvent::Grabbed(_))));
    }
}
