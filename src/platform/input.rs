//! Raw input translation
//!
//! A frontend fills a [`RawFrame`] each frame with what is physically held
//! and where the cursor is. [`InputTranslator`] keeps the previous frame so
//! it can turn levels into edges, then emits one [`TickInput`].
//!
//! Frame lifecycle: build `RawFrame` → `translate()` → `sim::tick()`.

use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::sim::tick::{Action, PointerHit, TickInput};

/// Logical machine buttons, whatever keys the frontend maps to them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Left,
    Right,
    /// Into the cabinet (-z)
    Forward,
    /// Toward the player (+z)
    Back,
    Descend,
}

impl Button {
    /// Horizontal direction in (x, z), zero for non-movement buttons
    pub fn direction(self) -> Vec2 {
        match self {
            Button::Left => Vec2::NEG_X,
            Button::Right => Vec2::X,
            Button::Forward => Vec2::NEG_Y,
            Button::Back => Vec2::Y,
            Button::Descend => Vec2::ZERO,
        }
    }
}

const MOVEMENT: [Button; 4] = [Button::Left, Button::Right, Button::Forward, Button::Back];

/// Everything the frontend observed this frame
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    pub held: HashSet<Button>,
    pub mouse_down: bool,
    /// Cursor in window pixels, origin top-left
    pub cursor: (f32, f32),
    /// Window size in pixels
    pub window_size: (f32, f32),
    pub viewpoint_frontal: bool,
}

impl Default for RawFrame {
    fn default() -> Self {
        Self {
            held: HashSet::new(),
            mouse_down: false,
            cursor: (0.0, 0.0),
            window_size: (1.0, 1.0),
            viewpoint_frontal: true,
        }
    }
}

/// How held movement buttons drive the claw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MovementInput {
    /// Smooth travel while held
    #[default]
    Continuous,
    /// One nudge per press
    Stepped,
}

/// Maps a click to the machine part under it
pub trait HitResolver {
    /// `pointer` is in normalized device coordinates, y up
    fn resolve(&self, pointer: Vec2) -> PointerHit;
}

/// Screen-space rectangles for each clickable part
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionResolver {
    pub coin_slot: Rect,
    pub lever: Option<Rect>,
    pub display: Rect,
}

impl RegionResolver {
    /// Flat front panel: coin slot under the glass, prize shelf bottom right
    pub fn arcade() -> Self {
        Self {
            coin_slot: Rect::new(Vec2::new(-0.25, -0.80), Vec2::new(0.25, -0.45)),
            lever: None,
            display: Rect::from_center(Vec2::new(0.32, -0.50), Vec2::splat(0.15)),
        }
    }

    /// Cabinet seen from the front: the red button doubles as coin slot
    /// and lamp switch
    pub fn cabinet() -> Self {
        let button = Rect::new(Vec2::new(-1.0, -0.6), Vec2::new(0.2, 0.6));
        Self {
            coin_slot: button,
            lever: Some(button),
            display: Rect::from_center(Vec2::new(-0.45, -0.75), Vec2::splat(0.12)),
        }
    }
}

impl HitResolver for RegionResolver {
    fn resolve(&self, pointer: Vec2) -> PointerHit {
        if self.display.contains(pointer) {
            return PointerHit::DisplayCompartment;
        }
        // A shared region acts as the lever; the session treats a lever
        // pull on a dark machine the same as a coin
        if let Some(lever) = self.lever {
            if lever.contains(pointer) {
                return PointerHit::Lever;
            }
        }
        if self.coin_slot.contains(pointer) {
            return PointerHit::CoinSlot;
        }
        PointerHit::None
    }
}

/// Pixel position to normalized device coordinates (y up)
pub fn normalize_cursor(cursor: (f32, f32), window_size: (f32, f32)) -> Vec2 {
    let (w, h) = window_size;
    if w <= 0.0 || h <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(cursor.0 / w * 2.0 - 1.0, 1.0 - cursor.1 / h * 2.0)
}

/// Turns held-state frames into edge-triggered tick input
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    pub movement: MovementInput,
    prev_held: HashSet<Button>,
    prev_mouse: bool,
}

impl InputTranslator {
    pub fn new(movement: MovementInput) -> Self {
        Self {
            movement,
            ..Default::default()
        }
    }

    fn pressed(&self, frame: &RawFrame, button: Button) -> bool {
        frame.held.contains(&button) && !self.prev_held.contains(&button)
    }

    pub fn translate(&mut self, frame: &RawFrame, hits: &dyn HitResolver) -> TickInput {
        let mut input = TickInput {
            descend_held: frame.held.contains(&Button::Descend),
            viewpoint_frontal: frame.viewpoint_frontal,
            ..Default::default()
        };

        match self.movement {
            MovementInput::Continuous => {
                let axis: Vec2 = MOVEMENT
                    .iter()
                    .filter(|b| frame.held.contains(*b))
                    .map(|b| b.direction())
                    .sum();
                input.move_axis = axis.clamp(Vec2::splat(-1.0), Vec2::ONE);
            }
            MovementInput::Stepped => {
                for button in MOVEMENT {
                    if self.pressed(frame, button) {
                        input.actions.push(Action::Nudge(button.direction()));
                    }
                }
            }
        }

        if self.pressed(frame, Button::Descend) {
            input.actions.push(Action::Descend);
        }

        if frame.mouse_down && !self.prev_mouse {
            let ndc = normalize_cursor(frame.cursor, frame.window_size);
            let hit = hits.resolve(ndc);
            log::trace!("click at {ndc} hit {hit:?}");
            input.actions.push(Action::Pointer(hit));
        }

        self.prev_held.clone_from(&frame.held);
        self.prev_mouse = frame.mouse_down;
        input
    }
}
