//! Per-frame simulation tick
//!
//! Runs the components in a fixed order:
//! pointer hits → gating → claw → toys → session reconciliation.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::claw::ClawCommand;
use super::session::LeverAction;
use super::state::{Claw, MachineEvent, MachineState, ToyId};
use crate::tuning::ResetPolicy;

/// Where a pointer click landed, as resolved by the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerHit {
    CoinSlot,
    Lever,
    DisplayCompartment,
    None,
}

/// Edge-triggered input, each consumed once by the tick that receives it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Descend button went down
    Descend,
    /// One discrete step of claw travel, in (x, z) step units
    Nudge(Vec2),
    Pointer(PointerHit),
}

/// Input commands for a single tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Continuous horizontal axis (x, z), each in [-1, 1]
    pub move_axis: Vec2,
    /// Descend button currently held (hold mode)
    pub descend_held: bool,
    /// Edge events for this frame, in arrival order
    pub actions: Vec<Action>,
    /// Camera is roughly in front of the machine; gates claw and pointer
    /// input. Always true for flat builds.
    pub viewpoint_frontal: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            move_axis: Vec2::ZERO,
            descend_held: false,
            actions: Vec::new(),
            viewpoint_frontal: true,
        }
    }
}

impl TickInput {
    fn claw_command(&self) -> ClawCommand {
        let mut cmd = ClawCommand {
            move_axis: self.move_axis,
            descend_held: self.descend_held,
            ..Default::default()
        };
        for action in &self.actions {
            match action {
                Action::Descend => cmd.descend_pressed = true,
                Action::Nudge(step) => cmd.nudge += *step,
                Action::Pointer(_) => {}
            }
        }
        cmd
    }

    fn pointer_hits(&self) -> impl Iterator<Item = PointerHit> + '_ {
        self.actions.iter().filter_map(|a| match a {
            Action::Pointer(hit) => Some(*hit),
            _ => None,
        })
    }
}

/// Advance the machine by `dt` seconds
pub fn tick(state: &mut MachineState, input: &TickInput, dt: f32) {
    state.events.clear();
    if !(dt.is_finite() && dt > 0.0) {
        log::warn!("ignoring tick with dt = {dt}");
        return;
    }
    state.time_ticks += 1;

    // 1) Pointer hits
    let mut collected: Vec<ToyId> = Vec::new();
    if input.viewpoint_frontal {
        for hit in input.pointer_hits() {
            match hit {
                PointerHit::CoinSlot => {
                    if state.session.on_coin() {
                        power_on(state);
                    }
                }
                PointerHit::Lever => match state.session.on_lever() {
                    LeverAction::PoweredOn => power_on(state),
                    LeverAction::LampToggled(on) => {
                        state.events.push(MachineEvent::LampToggled { on })
                    }
                    LeverAction::Ignored => {}
                },
                PointerHit::DisplayCompartment => {
                    collected.extend(state.toys.collect(state.session.is_blinking()));
                }
                PointerHit::None => {}
            }
        }
    }

    // 2) Gating
    let enabled = state.session.input_enabled() && input.viewpoint_frontal;

    // 3) Claw
    let cmd = input.claw_command();
    let outcome = state
        .claw
        .tick(&state.config, &cmd, enabled, state.toys.as_slice(), dt);
    if outcome.descent_started {
        state.events.push(MachineEvent::DescentStarted);
    }
    if outcome.bottomed_out {
        state.events.push(MachineEvent::ClawBottomedOut);
    }
    if let Some(id) = outcome.grabbed {
        state.toys.on_grabbed(id);
        state.events.push(MachineEvent::Grabbed(id));
    }
    if let Some(id) = outcome.released {
        let tip = state.claw.tip(&state.config);
        let released = state.toys.on_released(&state.config, id, tip);
        state.events.extend(released);
    }

    // 4) Toys
    let tip = state.claw.tip(&state.config);
    let toy_events = state.toys.tick(&state.config, tip, dt);
    state.events.extend(toy_events);

    // 5) Session reconciliation
    state
        .session
        .advance_blink(dt, state.config.blink_interval);
    if state.events.iter().any(|e| matches!(e, MachineEvent::ToyWon(_))) {
        state.session.on_toy_won();
    }
    if state
        .events
        .iter()
        .any(|e| matches!(e, MachineEvent::ToyDisplayed(_)))
    {
        state.session.on_toy_displayed();
    }
    if !collected.is_empty() {
        for id in &collected {
            log::debug!("toy {id} collected");
            state.events.push(MachineEvent::ToyCollected(*id));
        }
        if state.session.on_collected() {
            apply_reset(state);
        }
    }
}

/// Coin/lever brought the machine up: claw back to its rest pose, nothing
/// left hanging from it
fn power_on(state: &mut MachineState) {
    if let Some(id) = state.claw.retract() {
        let tip = state.claw.tip(&state.config);
        let released = state.toys.on_released(&state.config, id, tip);
        state.events.extend(released);
    }
    state.events.push(MachineEvent::PoweredOn);
}

fn apply_reset(state: &mut MachineState) {
    let policy = state.config.reset;
    log::debug!("prize collected, applying {policy:?}");
    match policy {
        ResetPolicy::FullReset => {
            state.claw = Claw::at_rest(&state.config);
            state.toys.reset_unwon();
        }
        ResetPolicy::PowerOff => {}
    }
    state.events.push(MachineEvent::PoweredOff);
    state.events.push(MachineEvent::Reset(policy));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{ClawMode, LampMode, ToyState};
    use crate::tuning::MachineConfig;
    use glam::Vec3;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 120.0;

    fn actions(actions: &[Action]) -> TickInput {
        TickInput {
            actions: actions.to_vec(),
            ..Default::default()
        }
    }

    fn coin() -> TickInput {
        actions(&[Action::Pointer(PointerHit::CoinSlot)])
    }

    fn descend() -> TickInput {
        actions(&[Action::Descend])
    }

    fn powered(config: MachineConfig) -> MachineState {
        let mut state = MachineState::new(config).unwrap();
        tick(&mut state, &coin(), DT);
        assert!(state.events.contains(&MachineEvent::PoweredOn));
        state
    }

    /// Tick with `input` until `done` holds, collecting every event
    fn run_until(
        state: &mut MachineState,
        input: &TickInput,
        mut done: impl FnMut(&MachineState) -> bool,
    ) -> Vec<MachineEvent> {
        let mut events = Vec::new();
        for _ in 0..20_000 {
            if done(state) {
                return events;
            }
            tick(state, input, DT);
            events.extend(state.events.iter().cloned());
        }
        panic!("condition never reached");
    }

    /// Toggle build: grab the toy at `toy_x`, carry it to `drop_x`, release
    fn grab_and_release(state: &mut MachineState, toy: ToyId, drop_x: f32) {
        state.claw.horizontal.x = state.toys.get(toy).unwrap().pos.x;
        tick(state, &descend(), DT);
        run_until(state, &TickInput::default(), |s| s.claw.is_retracted());
        assert_eq!(state.claw.carried, Some(toy));

        let dir = (drop_x - state.claw.horizontal.x).signum();
        let steer = TickInput {
            move_axis: Vec2::new(dir, 0.0),
            ..Default::default()
        };
        run_until(state, &steer, |s| {
            (s.claw.horizontal.x - drop_x) * dir >= 0.0
        });
        tick(state, &descend(), DT);
    }

    #[test]
    fn test_grab_on_descent() {
        let mut state = powered(MachineConfig::arcade_2d());
        state.claw.horizontal.x = state.toys.get(0).unwrap().pos.x;

        tick(&mut state, &descend(), DT);
        assert_eq!(state.claw.mode, ClawMode::Descending);
        assert!(state.events.contains(&MachineEvent::DescentStarted));

        let events = run_until(&mut state, &TickInput::default(), |s| {
            s.claw.mode == ClawMode::Ascending
        });
        assert!(events.contains(&MachineEvent::Grabbed(0)));
        assert!(!events.contains(&MachineEvent::ClawBottomedOut));
        assert_eq!(state.claw.carried, Some(0));
        assert_eq!(state.toys.get(0).unwrap().state, ToyState::Carried);

        // The contact happened while the tip was within range of the toy
        let tip = state.claw.tip(&state.config);
        assert!((tip.y - state.toys.get(0).unwrap().start_pos.y).abs() < 0.2 + 0.01);
    }

    #[test]
    fn test_empty_descent_bottoms_out() {
        let mut state = powered(MachineConfig::arcade_2d());
        tick(&mut state, &descend(), DT);
        let mut max_ext: f32 = 0.0;
        let mut events = Vec::new();
        for _ in 0..2000 {
            tick(&mut state, &TickInput::default(), DT);
            max_ext = max_ext.max(state.claw.extension);
            events.extend(state.events.iter().cloned());
        }
        assert_eq!(max_ext, state.config.max_extension);
        assert!(events.contains(&MachineEvent::ClawBottomedOut));
        assert!(state.claw.carried.is_none());
        assert!(state.claw.is_retracted());
    }

    #[test]
    fn test_release_over_hole_wins_and_blinks() {
        let mut state = powered(MachineConfig::arcade_2d());
        grab_and_release(&mut state, 1, 0.35);
        assert_eq!(state.toys.get(1).unwrap().state, ToyState::Falling);

        let events = run_until(&mut state, &TickInput::default(), |s| {
            s.toys.get(1).unwrap().state == ToyState::OnDisplay
        });
        assert!(events.contains(&MachineEvent::ToyWon(1)));
        assert!(state.toys.get(1).unwrap().won);
        assert!(state.session.is_blinking());
        assert!(!state.session.game_running);
        assert!(!state.session.input_enabled());
    }

    #[test]
    fn test_win_pauses_play_while_still_falling() {
        let mut state = powered(MachineConfig::arcade_2d());
        grab_and_release(&mut state, 1, 0.35);
        run_until(&mut state, &TickInput::default(), |s| {
            s.toys.get(1).unwrap().state == ToyState::WonFalling
        });
        assert!(!state.session.game_running);
        assert!(!state.session.is_blinking());

        // Claw ignores input until the prize is dealt with
        let x = state.claw.horizontal.x;
        let steer = TickInput {
            move_axis: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        tick(&mut state, &steer, DT);
        assert_eq!(state.claw.horizontal.x, x);
    }

    #[test]
    fn test_release_outside_hole_lands_on_floor() {
        let mut state = powered(MachineConfig::arcade_2d());
        grab_and_release(&mut state, 0, 0.0);
        run_until(&mut state, &TickInput::default(), |s| {
            s.toys.get(0).unwrap().state == ToyState::FloorRest
        });
        let toy = state.toys.get(0).unwrap();
        assert_eq!(toy.pos.y, state.config.floor_height);
        assert!(!toy.won);
        assert!(state.session.game_running);
        assert!(state.session.input_enabled());
    }

    #[test]
    fn test_collect_applies_full_reset() {
        let mut state = powered(MachineConfig::arcade_2d());
        // Move toy 0 to the floor first, so the reset has something to undo
        grab_and_release(&mut state, 0, 0.0);
        run_until(&mut state, &TickInput::default(), |s| {
            s.toys.get(0).unwrap().state == ToyState::FloorRest
        });
        grab_and_release(&mut state, 1, 0.35);
        run_until(&mut state, &TickInput::default(), |s| s.session.is_blinking());

        tick(
            &mut state,
            &actions(&[Action::Pointer(PointerHit::DisplayCompartment)]),
            DT,
        );
        assert!(state.events.contains(&MachineEvent::ToyCollected(1)));
        assert!(state.events.contains(&MachineEvent::Reset(ResetPolicy::FullReset)));
        assert_eq!(state.toys.get(1).unwrap().state, ToyState::Collected);
        assert!(!state.session.is_blinking());
        assert!(!state.session.machine_on);
        assert_eq!(state.session.lamp, LampMode::Off);
        assert_eq!(state.claw.horizontal, Vec2::ZERO);
        let toy0 = state.toys.get(0).unwrap();
        assert_eq!(toy0.state, ToyState::Resting);
        assert_eq!(toy0.pos, toy0.start_pos);

        // Collected toy stays gone after the next coin
        tick(&mut state, &coin(), DT);
        assert!(state.session.machine_on);
        assert_eq!(state.toys.get(1).unwrap().state, ToyState::Collected);
    }

    #[test]
    fn test_collect_click_ignored_without_prize() {
        let mut state = powered(MachineConfig::arcade_2d());
        tick(
            &mut state,
            &actions(&[Action::Pointer(PointerHit::DisplayCompartment)]),
            DT,
        );
        assert!(state.session.machine_on);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_cabinet_hold_session_powers_off_on_collect() {
        let mut state = powered(MachineConfig::cabinet_3d());
        let hold = TickInput {
            descend_held: true,
            ..Default::default()
        };
        let events = run_until(&mut state, &hold, |s| s.claw.carried.is_some());
        assert!(events.contains(&MachineEvent::Grabbed(0)));

        // Rise with the prize, then press again to let go over the hole
        run_until(&mut state, &TickInput::default(), |s| s.claw.is_retracted());
        tick(
            &mut state,
            &TickInput {
                descend_held: true,
                actions: vec![Action::Descend],
                ..Default::default()
            },
            DT,
        );
        assert!(state.events.contains(&MachineEvent::ToyDisplayed(0)));
        assert!(state.session.is_blinking());
        assert_eq!(
            state.toys.get(0).unwrap().pos,
            state.config.display_position
        );

        tick(
            &mut state,
            &actions(&[Action::Pointer(PointerHit::DisplayCompartment)]),
            DT,
        );
        assert!(state.events.contains(&MachineEvent::Reset(ResetPolicy::PowerOff)));
        assert!(!state.session.machine_on);
        assert_eq!(state.toys.get(0).unwrap().state, ToyState::Collected);
        // Rabbit untouched
        assert_eq!(state.toys.get(1).unwrap().state, ToyState::Resting);
    }

    #[test]
    fn test_cabinet_nudges_and_floor_drop() {
        let mut state = powered(MachineConfig::cabinet_3d());
        // Three steps right puts the claw outside the hole
        let nudge = actions(&[Action::Nudge(Vec2::X)]);
        for _ in 0..3 {
            tick(&mut state, &nudge, DT);
        }
        assert!((state.claw.horizontal.x - 0.042).abs() < 1e-5);

        let hold = TickInput {
            descend_held: true,
            ..Default::default()
        };
        run_until(&mut state, &hold, |s| s.claw.carried.is_some());
        let carried = state.claw.carried.unwrap();
        run_until(&mut state, &TickInput::default(), |s| s.claw.is_retracted());
        tick(&mut state, &descend(), DT);

        let toy = state.toys.get(carried).unwrap();
        assert_eq!(toy.state, ToyState::FloorRest);
        assert_eq!(toy.pos.y, state.config.floor_height);
        assert!(state.session.input_enabled());
    }

    #[test]
    fn test_release_judged_after_same_tick_nudge() {
        let mut state = powered(MachineConfig::cabinet_3d());
        let hold = TickInput {
            descend_held: true,
            ..Default::default()
        };
        run_until(&mut state, &hold, |s| s.claw.carried.is_some());
        run_until(&mut state, &TickInput::default(), |s| s.claw.is_retracted());

        // Park just outside the hole and let the toy follow
        state.claw.horizontal.x = 0.03;
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.toys.get(0).unwrap().pos.x, 0.03);

        // One step left lands inside the hole in the same tick as release
        tick(
            &mut state,
            &actions(&[Action::Nudge(Vec2::NEG_X), Action::Descend]),
            DT,
        );
        let x = state.claw.horizontal.x;
        assert!((x - 0.016).abs() < 1e-5);
        let released = state.events.iter().find_map(|e| match e {
            MachineEvent::Released { toy: 0, position } => Some(*position),
            _ => None,
        });
        assert_eq!(released.map(|p| p.x), Some(x));
        assert_eq!(state.toys.get(0).unwrap().state, ToyState::OnDisplay);
        assert!(state.session.is_blinking());
    }

    #[test]
    fn test_viewpoint_gates_claw_and_pointer() {
        let mut state = MachineState::new(MachineConfig::cabinet_3d()).unwrap();
        let mut input = coin();
        input.viewpoint_frontal = false;
        tick(&mut state, &input, DT);
        assert!(!state.session.machine_on);

        tick(&mut state, &coin(), DT);
        let side = TickInput {
            actions: vec![Action::Nudge(Vec2::X)],
            viewpoint_frontal: false,
            ..Default::default()
        };
        tick(&mut state, &side, DT);
        assert_eq!(state.claw.horizontal, Vec2::ZERO);
    }

    #[test]
    fn test_lever_toggles_lamp_while_playing() {
        let mut state = powered(MachineConfig::arcade_2d());
        tick(&mut state, &actions(&[Action::Pointer(PointerHit::Lever)]), DT);
        assert!(state.events.contains(&MachineEvent::LampToggled { on: false }));
        assert!(state.session.input_enabled());
    }

    #[test]
    fn test_degenerate_dt_is_noop() {
        let mut state = powered(MachineConfig::arcade_2d());
        let ticks = state.time_ticks;
        tick(&mut state, &descend(), 0.0);
        tick(&mut state, &descend(), -1.0);
        tick(&mut state, &descend(), f32::NAN);
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.claw.mode, ClawMode::AtRest);
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            coin(),
            TickInput {
                move_axis: Vec2::new(1.0, 0.0),
                ..Default::default()
            },
            descend(),
            TickInput::default(),
        ];
        let mut a = MachineState::new(MachineConfig::arcade_2d()).unwrap();
        let mut b = MachineState::new(MachineConfig::arcade_2d()).unwrap();
        for _ in 0..50 {
            for input in &inputs {
                tick(&mut a, input, DT);
                tick(&mut b, input, DT);
            }
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.claw.extension, b.claw.extension);
        assert_eq!(a.claw.horizontal, b.claw.horizontal);
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            4 => Just(Action::Descend),
            2 => (-1i8..=1, -1i8..=1).prop_map(|(x, z)| Action::Nudge(Vec2::new(x as f32, z as f32))),
            1 => Just(Action::Pointer(PointerHit::CoinSlot)),
            1 => Just(Action::Pointer(PointerHit::Lever)),
            2 => Just(Action::Pointer(PointerHit::DisplayCompartment)),
        ]
    }

    fn arb_input() -> impl Strategy<Value = (TickInput, f32)> {
        (
            -1.0f32..=1.0,
            -1.0f32..=1.0,
            any::<bool>(),
            prop::collection::vec(arb_action(), 0..2),
            0.001f32..0.2,
        )
            .prop_map(|(x, z, held, actions, dt)| {
                (
                    TickInput {
                        move_axis: Vec2::new(x, z),
                        descend_held: held,
                        actions,
                        viewpoint_frontal: true,
                    },
                    dt,
                )
            })
    }

    fn check_invariants(state: &MachineState) -> Result<(), TestCaseError> {
        let c = &state.config;
        let h = state.claw.horizontal;
        prop_assert!(h.x >= c.bounds.min.x && h.x <= c.bounds.max.x);
        prop_assert!(h.y >= c.bounds.min.y && h.y <= c.bounds.max.y);
        prop_assert!(state.claw.extension >= 0.0 && state.claw.extension <= c.max_extension);

        let carried: Vec<ToyId> = state
            .toys
            .iter()
            .filter(|t| t.state == ToyState::Carried)
            .map(|t| t.id)
            .collect();
        prop_assert!(carried.len() <= 1);
        prop_assert_eq!(carried.first().copied(), state.claw.carried);

        if state.session.is_blinking() {
            prop_assert!(state.toys.has_pending_prize());
            prop_assert!(!state.session.game_running);
        }
        if state.toys.has_pending_prize() {
            prop_assert!(!state.session.game_running);
        }
        Ok(())
    }

    fn run_random(config: MachineConfig, inputs: &[(TickInput, f32)]) -> Result<(), TestCaseError> {
        let mut state = MachineState::new(config).unwrap();
        let mut frozen: Vec<(ToyId, Vec3)> = Vec::new();
        for (input, dt) in inputs {
            tick(&mut state, input, *dt);
            check_invariants(&state)?;
            for (id, pos) in &frozen {
                let toy = state.toys.get(*id).unwrap();
                prop_assert_eq!(toy.state, ToyState::Collected);
                prop_assert_eq!(toy.pos, *pos);
            }
            for toy in state.toys.iter() {
                if toy.state == ToyState::Collected && !frozen.iter().any(|(id, _)| *id == toy.id) {
                    frozen.push((toy.id, toy.pos));
                }
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn arcade_invariants_hold(inputs in prop::collection::vec(arb_input(), 1..400)) {
            run_random(MachineConfig::arcade_2d(), &inputs)?;
        }

        #[test]
        fn cabinet_invariants_hold(inputs in prop::collection::vec(arb_input(), 1..400)) {
            run_random(MachineConfig::cabinet_3d(), &inputs)?;
        }
    }
}
