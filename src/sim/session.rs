//! Game session and lamp state machine
//!
//! Owns power, the play gate and the lamp. Claw and toys never touch these
//! fields; they report events which the tick feeds back in here.

use super::state::{LampMode, Session};

/// Result of pulling the lever
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeverAction {
    PoweredOn,
    LampToggled(bool),
    Ignored,
}

impl Session {
    /// Claw and toy input is accepted only while this holds
    pub fn input_enabled(&self) -> bool {
        self.machine_on && self.game_running && !self.is_blinking()
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.lamp, LampMode::Blinking { .. })
    }

    /// Coin inserted. Returns true if it switched the machine on.
    pub fn on_coin(&mut self) -> bool {
        if self.machine_on {
            return false;
        }
        self.power_on();
        true
    }

    pub fn on_lever(&mut self) -> LeverAction {
        if !self.machine_on {
            self.power_on();
            return LeverAction::PoweredOn;
        }
        match self.lamp {
            LampMode::Blinking { .. } => LeverAction::Ignored,
            LampMode::Steady => {
                self.lamp = LampMode::Off;
                LeverAction::LampToggled(false)
            }
            LampMode::Off => {
                self.lamp = LampMode::Steady;
                LeverAction::LampToggled(true)
            }
        }
    }

    fn power_on(&mut self) {
        log::debug!("machine on");
        self.machine_on = true;
        self.game_running = true;
        self.lamp = LampMode::Steady;
    }

    pub fn power_off(&mut self) {
        log::debug!("machine off");
        self.machine_on = false;
        self.game_running = false;
        self.lamp = LampMode::Off;
    }

    /// A toy went through the hole; play pauses until it is collected
    pub fn on_toy_won(&mut self) {
        self.game_running = false;
    }

    /// A won toy reached the prize compartment
    pub fn on_toy_displayed(&mut self) {
        self.game_running = false;
        if !self.is_blinking() {
            log::debug!("prize on display, lamp blinking");
            self.lamp = LampMode::Blinking {
                green: true,
                timer: 0.0,
            };
        }
    }

    /// Prize taken. Returns false (and changes nothing) unless blinking.
    pub fn on_collected(&mut self) -> bool {
        if !self.is_blinking() {
            return false;
        }
        self.power_off();
        true
    }

    /// Advance the blink timer, flipping the color once per whole
    /// `interval` elapsed. Returns the number of flips.
    pub fn advance_blink(&mut self, dt: f32, interval: f32) -> u32 {
        let LampMode::Blinking { green, timer } = &mut self.lamp else {
            return 0;
        };
        *timer += dt;
        let mut flips = 0;
        while *timer >= interval {
            *timer -= interval;
            *green = !*green;
            flips += 1;
        }
        flips
    }
}
