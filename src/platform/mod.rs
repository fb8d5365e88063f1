//! Platform abstraction layer
//!
//! Frontends (windowing, rendering, audio) live outside this crate. This
//! layer only turns their raw per-frame input into a [`TickInput`].
//!
//! [`TickInput`]: crate::sim::TickInput

pub mod input;

pub use input::{Button, HitResolver, InputTranslator, MovementInput, RawFrame, RegionResolver};
