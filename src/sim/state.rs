//! Game state and core simulation types
//!
//! `GameState` owns everything one play session mutates. Subsystems are free
//! functions over `&mut GameState` so that a single logical thread owns the
//! session and no two call sites hold an entity at once.

use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::events::{GameEvent, HostState};
use super::physics::Balloon;
use super::pool::EntityPool;
use super::run::RunPhase;
use super::scoring::{Difficulty, RunSession, Telemetry};
use super::spawn::SpawnDirector;
use super::timers::Timers;
use crate::assets::{AssetCatalog, AssetManifest};
use crate::consts::*;
use crate::tuning::Tuning;

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObstacleKind {
    Bird,
    Airplane,
    Ufo,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Bird, ObstacleKind::Airplane, ObstacleKind::Ufo];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Bird => "bird",
            ObstacleKind::Airplane => "airplane",
            ObstacleKind::Ufo => "ufo",
        }
    }

    /// Base spawn weight (bird common, UFO rare)
    pub fn weight(&self) -> f32 {
        match self {
            ObstacleKind::Bird => 0.5,
            ObstacleKind::Airplane => 0.3,
            ObstacleKind::Ufo => 0.2,
        }
    }

    /// (sprite scale, hitbox width fraction, hitbox height fraction)
    pub fn config(&self) -> (f32, f32, f32) {
        match self {
            ObstacleKind::Bird => (0.25, 0.6, 0.8),
            ObstacleKind::Airplane => (0.35, 0.7, 0.5),
            ObstacleKind::Ufo => (0.4, 0.8, 0.6),
        }
    }
}

impl fmt::Display for ObstacleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Fuel,
    Shield,
    Thermal,
    Wind,
    Turbo,
}

impl PowerUpKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Fuel => "fuel",
            PowerUpKind::Shield => "shield",
            PowerUpKind::Thermal => "thermal",
            PowerUpKind::Wind => "wind",
            PowerUpKind::Turbo => "turbo",
        }
    }

    /// Score before the combo multiplier
    pub fn base_points(&self) -> u64 {
        match self {
            PowerUpKind::Fuel => 100,
            PowerUpKind::Shield => 200,
            PowerUpKind::Thermal => 150,
            PowerUpKind::Wind => 120,
            PowerUpKind::Turbo => 300,
        }
    }
}

/// Power-up sprite scale and hitbox expansion (regular, zone reward)
pub const POWERUP_SCALE: f32 = 0.2;
pub const POWERUP_HITBOX_EXPANSION: f32 = 2.5;
pub const SPECIAL_POWERUP_SCALE: f32 = 0.25;
pub const SPECIAL_POWERUP_HITBOX_EXPANSION: f32 = 3.0;

/// Which pool class an entity is recycled through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolClass {
    Obstacle,
    PowerUp,
}

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(ObstacleKind),
    PowerUp(PowerUpKind),
}

impl EntityKind {
    pub fn class(&self) -> PoolClass {
        match self {
            EntityKind::Obstacle(_) => PoolClass::Obstacle,
            EntityKind::PowerUp(_) => PoolClass::PowerUp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Obstacle(k) => k.as_str(),
            EntityKind::PowerUp(k) => k.as_str(),
        }
    }

    /// Unscaled sprite dimensions in pixels
    pub fn sprite_size(&self) -> Vec2 {
        match self {
            EntityKind::Obstacle(ObstacleKind::Bird) => Vec2::new(160.0, 120.0),
            EntityKind::Obstacle(ObstacleKind::Airplane) => Vec2::new(240.0, 120.0),
            EntityKind::Obstacle(ObstacleKind::Ufo) => Vec2::new(200.0, 120.0),
            EntityKind::PowerUp(_) => Vec2::new(128.0, 128.0),
        }
    }
}

/// Sprite facing for directional textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Left,
    Right,
}

/// Per-entity motion pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Straight-line drift at the entity's velocity
    Drift,
    /// Sinusoidal yo-yo around `anchor_y`: reaches `anchor_y + offset` every `half_period`
    Bob {
        anchor_y: f32,
        offset: f32,
        half_period: f32,
        started_at: f32,
    },
    /// Random lateral velocity re-rolled periodically, occasional teleport
    Jitter { next_at: f32 },
}

/// A pooled obstacle or power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub scale: f32,
    /// Hitbox size as a fraction of the visual size (<1 obstacles, >1 power-ups)
    pub hitbox_fraction: Vec2,
    pub motion: Motion,
    pub facing: Facing,
    /// Resolved texture key (see `assets`)
    pub texture: String,
    /// Spawned by a wave formation
    pub wave_spawned: bool,
    /// Zone reward power-up
    pub special: bool,
}

impl Entity {
    /// A parked, unconfigured entity
    pub fn parked(kind: EntityKind) -> Self {
        Self {
            kind,
            pos: Vec2::new(PARKED_POS.0, PARKED_POS.1),
            vel: Vec2::ZERO,
            scale: 1.0,
            hitbox_fraction: Vec2::ONE,
            motion: Motion::Drift,
            facing: Facing::Left,
            texture: String::new(),
            wave_spawned: false,
            special: false,
        }
    }

    /// On-screen sprite size
    pub fn visual_size(&self) -> Vec2 {
        self.kind.sprite_size() * self.scale
    }

    /// Collision box centered on the entity
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, self.visual_size() * self.hitbox_fraction)
    }

    /// Advance motion by `dt`; `now` is the simulation clock after the step
    pub fn advance(&mut self, dt: f32, now: f32) {
        self.pos.x += self.vel.x * dt;
        match self.motion {
            Motion::Bob {
                anchor_y,
                offset,
                half_period,
                started_at,
            } => {
                let phase = (now - started_at) / half_period * std::f32::consts::PI;
                self.pos.y = anchor_y + offset * (1.0 - phase.cos()) * 0.5;
            }
            Motion::Drift | Motion::Jitter { .. } => {
                self.pos.y += self.vel.y * dt;
            }
        }
    }
}

/// Complete game state for one session
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: RunPhase,
    /// Phase to return to when a pause ends
    pub resume_to: Option<RunPhase>,
    /// Remaining countdown steps
    pub countdown: u8,
    pub countdown_timer: Option<super::timers::TimerId>,
    pub balloon: Balloon,
    pub pool: EntityPool,
    pub spawner: SpawnDirector,
    pub session: RunSession,
    pub difficulty: Difficulty,
    pub telemetry: Telemetry,
    pub timers: Timers,
    pub assets: Rc<dyn AssetCatalog>,
    /// Outbound events, drained by the host each frame
    pub events: Vec<GameEvent>,
    /// Last host-facing state announced
    pub announced: Option<HostState>,
}

impl GameState {
    /// Create a new game state with the given seed and default balance
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self::with_assets(seed, tuning, Rc::new(AssetManifest::standard()))
    }

    /// Invalid tuning is replaced by the defaults
    pub fn with_assets(seed: u64, tuning: Tuning, assets: Rc<dyn AssetCatalog>) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Rejected tuning ({e}), using defaults");
                Tuning::default()
            }
        };
        let mut pool = EntityPool::new(tuning.max_active_entities);
        pool.prewarm(PoolClass::Obstacle, tuning.pool_prewarm);
        pool.prewarm(PoolClass::PowerUp, tuning.pool_prewarm);

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            balloon: Balloon::new(),
            spawner: SpawnDirector::new(&tuning),
            countdown: tuning.countdown_from,
            difficulty: Difficulty::new(&tuning),
            tuning,
            phase: RunPhase::Loading,
            resume_to: None,
            countdown_timer: None,
            pool,
            session: RunSession::default(),
            telemetry: Telemetry::default(),
            timers: Timers::default(),
            assets,
            events: Vec::new(),
            announced: None,
        };
        state.announce_state();
        state
    }

    /// Simulation clock (seconds since the state was created, paused time excluded)
    pub fn now(&self) -> f32 {
        self.timers.now()
    }

    /// Queue an outbound event
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain queued events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Emit `StateChanged` if the host-facing state differs from the last one announced
    pub fn announce_state(&mut self) {
        let host = self.phase.host_state();
        if self.announced != Some(host) {
            self.announced = Some(host);
            self.emit(GameEvent::StateChanged(host));
        }
    }

    /// Obstacle speed multiplier from the difficulty level
    pub fn speed_multiplier(&self) -> f32 {
        1.0 + (self.difficulty.level.saturating_sub(1)) as f32 * self.tuning.scoring.speed_per_level
    }

    /// Whether the balloon is currently shielded
    pub fn shield_active(&self) -> bool {
        self.balloon.has_buff(super::physics::BuffKind::Shield)
    }
}
