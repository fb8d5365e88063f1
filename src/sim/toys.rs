//! Toy physics and resolution
//!
//! Owns every toy's position and lifecycle: carrying, free fall, hole/floor
//! classification, the prize shelf and collection.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::{in_hole_column, resolve_drop, swept_through_window};
use super::state::{MachineEvent, Toy, ToyId, ToyState};
use crate::tuning::{MachineConfig, ToySpawn, WinRule};

/// All toys in the machine, sorted by id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToyPhysics {
    toys: Vec<Toy>,
}

impl ToyPhysics {
    pub fn spawn(spawns: &[ToySpawn]) -> Self {
        let toys = spawns
            .iter()
            .enumerate()
            .map(|(i, s)| Toy::new(i as ToyId, s))
            .collect();
        Self { toys }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Toy> {
        self.toys.iter()
    }

    pub fn as_slice(&self) -> &[Toy] {
        &self.toys
    }

    pub fn len(&self) -> usize {
        self.toys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toys.is_empty()
    }

    pub fn get(&self, id: ToyId) -> Option<&Toy> {
        self.toys.get(id as usize)
    }

    fn get_mut(&mut self, id: ToyId) -> Option<&mut Toy> {
        self.toys.get_mut(id as usize)
    }

    /// Any toy won but not yet collected
    pub fn has_pending_prize(&self) -> bool {
        self.toys
            .iter()
            .any(|t| matches!(t.state, ToyState::WonFalling | ToyState::OnDisplay))
    }

    /// The claw picked this toy up
    pub fn on_grabbed(&mut self, id: ToyId) {
        if let Some(toy) = self.get_mut(id) {
            if toy.state.is_grabbable() {
                toy.state = ToyState::Carried;
                toy.vel_y = 0.0;
            }
        }
    }

    /// The claw let go of this toy with its tip at `claw_tip`. Drop-zone
    /// machines resolve the outcome right here; fall-through machines start
    /// the toy falling.
    pub fn on_released(
        &mut self,
        config: &MachineConfig,
        id: ToyId,
        claw_tip: Vec3,
    ) -> Vec<MachineEvent> {
        let mut events = Vec::new();
        let Some(toy) = self.get_mut(id) else {
            return events;
        };
        if toy.state != ToyState::Carried {
            return events;
        }
        // The claw may have moved earlier in this tick
        toy.pos = claw_tip - Vec3::new(0.0, config.tip_offset, 0.0);
        log::debug!("toy {id} released at {}", toy.pos);
        events.push(MachineEvent::Released {
            toy: id,
            position: toy.pos,
        });

        match config.win {
            WinRule::FallThrough { .. } => {
                toy.state = ToyState::Falling;
                toy.vel_y = 0.0;
            }
            WinRule::DropZone { hole, drop_area } => {
                let (drop, in_hole) =
                    resolve_drop(&hole, &drop_area, Vec2::new(toy.pos.x, toy.pos.z));
                toy.vel_y = 0.0;
                if in_hole {
                    toy.won = true;
                    toy.pos = config.display_position;
                    toy.state = ToyState::OnDisplay;
                    log::debug!("toy {id} dropped into the hole at {drop}");
                    events.push(MachineEvent::ToyWon(id));
                    events.push(MachineEvent::ToyDisplayed(id));
                } else {
                    toy.pos = Vec3::new(drop.x, config.floor_height, drop.y);
                    toy.state = ToyState::FloorRest;
                    events.push(MachineEvent::ToyLanded(id));
                }
            }
        }
        events
    }

    /// Advance carried and falling toys
    pub fn tick(&mut self, config: &MachineConfig, claw_tip: Vec3, dt: f32) -> Vec<MachineEvent> {
        let mut events = Vec::new();
        let hang = Vec3::new(0.0, config.tip_offset, 0.0);

        for toy in &mut self.toys {
            match toy.state {
                ToyState::Carried => {
                    toy.pos = claw_tip - hang;
                }
                ToyState::Falling => {
                    let y_prev = toy.pos.y;
                    integrate(toy, config.gravity, dt);

                    if let WinRule::FallThrough {
                        center,
                        half_extents,
                    } = config.win
                    {
                        if swept_through_window(toy.pos.x, y_prev, toy.pos.y, center, half_extents) {
                            log::debug!("toy {} fell through the hole", toy.id);
                            toy.won = true;
                            toy.state = ToyState::WonFalling;
                            events.push(MachineEvent::ToyWon(toy.id));
                            continue;
                        }
                    }

                    if toy.pos.y <= config.floor_height && !above_hole(config, toy.pos.x) {
                        toy.pos.y = config.floor_height;
                        toy.vel_y = 0.0;
                        toy.state = ToyState::FloorRest;
                        events.push(MachineEvent::ToyLanded(toy.id));
                    }
                }
                ToyState::WonFalling => {
                    integrate(toy, config.gravity, dt);
                    if toy.pos.y <= config.display_position.y {
                        toy.pos.y = config.display_position.y;
                        toy.vel_y = 0.0;
                        toy.state = ToyState::OnDisplay;
                        log::debug!("toy {} reached the prize shelf", toy.id);
                        events.push(MachineEvent::ToyDisplayed(toy.id));
                    }
                }
                ToyState::Resting
                | ToyState::FloorRest
                | ToyState::OnDisplay
                | ToyState::Collected => {}
            }
        }
        events
    }

    /// Player clicked the prize compartment. Only honoured while the lamp
    /// blinks; returns the toys taken.
    pub fn collect(&mut self, blinking: bool) -> Vec<ToyId> {
        if !blinking {
            return Vec::new();
        }
        let mut taken = Vec::new();
        for toy in &mut self.toys {
            if toy.state == ToyState::OnDisplay {
                toy.state = ToyState::Collected;
                toy.vel_y = 0.0;
                taken.push(toy.id);
            }
        }
        taken
    }

    /// Return every toy still in play (never won) to its start position
    pub fn reset_unwon(&mut self) {
        for toy in &mut self.toys {
            if !toy.won && toy.state != ToyState::Collected {
                toy.return_to_start();
            }
        }
    }
}

fn integrate(toy: &mut Toy, gravity: f32, dt: f32) {
    toy.vel_y -= gravity * dt;
    toy.pos.y += toy.vel_y * dt;
}

/// Floor has a gap under the hole on fall-through machines
fn above_hole(config: &MachineConfig, x: f32) -> bool {
    match config.win {
        WinRule::FallThrough {
            center,
            half_extents,
        } => in_hole_column(x, center, half_extents),
        WinRule::DropZone { .. } => false,
    }
}
