//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Δt-driven updates only (no wall clock)
//! - Seeded RNG only
//! - Stable iteration order (pool slot order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod events;
pub mod physics;
pub mod pool;
pub mod run;
pub mod scoring;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::{Aabb, resolve_collisions};
pub use events::{EndReason, Feedback, GameEvent, HostState, RunSummary};
pub use physics::{Balloon, BuffKind, Direction};
pub use pool::{EntityHandle, EntityPool};
pub use run::RunPhase;
pub use scoring::{Difficulty, RunSession, Telemetry, combo_multiplier};
pub use snapshot::FrameSnapshot;
pub use spawn::{EnvZone, SpawnDirector, WaveKind, WavePattern, ZoneKind};
pub use state::{Entity, EntityKind, Facing, GameState, Motion, ObstacleKind, PoolClass, PowerUpKind};
pub use tick::{TickInput, tick};
pub use timers::{TimerEvent, TimerId, Timers};
