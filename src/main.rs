//! Claw Machine headless demo
//!
//! Runs the autopilot against a machine preset (or a JSON config) at a fixed
//! timestep, logs what happens, and prints the final snapshot as JSON.
//!
//! Usage: `claw-machine [2d | 3d | <config.json>] [seconds] [seed]`

use std::process::ExitCode;

use claw_machine::consts::SIM_DT;
use claw_machine::sim::{Autopilot, MachineEvent, MachineState, tick};
use claw_machine::{ConfigError, MachineConfig};

const DEFAULT_SECONDS: f32 = 120.0;
const DEFAULT_SEED: u64 = 0xC1A3;

fn load_config(arg: Option<&str>) -> Result<MachineConfig, String> {
    match arg {
        None | Some("2d") => Ok(MachineConfig::arcade_2d()),
        Some("3d") => Ok(MachineConfig::cabinet_3d()),
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("failed to read {path}: {e}"))?;
            MachineConfig::from_json(&text).map_err(|e: ConfigError| format!("{path}: {e}"))
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match load_config(args.first().map(String::as_str)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let seconds = args
        .get(1)
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_SECONDS);
    let seed = args
        .get(2)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED);

    let mut state = match MachineState::new(config) {
        Ok(state) => state,
        Err(e) => {
            log::error!("invalid machine config: {e}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Claw Machine (headless) starting: {:?} descent, {} toys, {seconds}s, seed {seed}",
        state.config.descent,
        state.toys.len()
    );

    let mut pilot = Autopilot::new(seed);
    let steps = (seconds / SIM_DT).max(0.0) as u64;
    let mut prizes = 0u32;
    for _ in 0..steps {
        let input = pilot.next_input(&state, SIM_DT);
        tick(&mut state, &input, SIM_DT);
        for event in &state.events {
            if matches!(event, MachineEvent::ToyCollected(_)) {
                prizes += 1;
            }
            log::info!(
                "[{:>7.2}s] {event:?}",
                state.time_ticks as f32 * SIM_DT
            );
        }
    }
    log::info!("Run finished: {prizes} prize(s) collected");

    match serde_json::to_string_pretty(&state.snapshot()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("failed to serialize snapshot: {e}");
            ExitCode::FAILURE
        }
    }
}
