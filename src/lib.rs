//! Sky Ascent - A rising balloon arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, run state)
//! - `game`: Host-facing controller (controls in, telemetry callbacks out)
//! - `tuning`: Data-driven game balance
//! - `highscores` / `cache`: Leaderboard collaborators (optional, offline-safe)
//! - `assets`: Asset catalog queried for texture keys
//! - `platform`: Browser bindings

pub mod assets;
pub mod cache;
pub mod game;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{Game, GameObserver, HostState};
pub use highscores::{HighScores, Leaderboard};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration the per-frame damping factors are expressed in (60 Hz)
    pub const NOMINAL_DT: f32 = 1.0 / 60.0;
    /// Largest frame delta fed to the simulation; longer gaps are clamped
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// World dimensions (portrait, pixels)
    pub const WORLD_WIDTH: f32 = 720.0;
    pub const WORLD_HEIGHT: f32 = 1280.0;

    /// Balloon starts horizontally centered, 150px above the bottom edge
    pub const BALLOON_START_X: f32 = WORLD_WIDTH / 2.0;
    pub const BALLOON_START_Y: f32 = WORLD_HEIGHT - 150.0;

    /// Pixels of upward displacement per altitude unit
    pub const ALTITUDE_UNIT: f32 = 10.0;

    /// Where released entities are parked (well outside the play area)
    pub const PARKED_POS: (f32, f32) = (-1000.0, -1000.0);
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Horizontal center of the world
#[inline]
pub fn world_center_x() -> f32 {
    consts::WORLD_WIDTH / 2.0
}

/// Clamp a point's x coordinate into `[margin, WORLD_WIDTH - margin]`
#[inline]
pub fn clamp_to_columns(pos: Vec2, margin: f32) -> Vec2 {
    Vec2::new(pos.x.clamp(margin, consts::WORLD_WIDTH - margin), pos.y)
}
