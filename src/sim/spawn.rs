//! Spawn director
//!
//! Decides when and where obstacles and power-ups appear. Cadence adapts to
//! the difficulty level, the altitude band and how actively the player has
//! been steering. Occasionally a formation (wave) replaces single spawns, or
//! a short-lived danger/bonus zone drops a cluster ahead of the balloon.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::events::{Feedback, GameEvent};
use super::pool::EntityHandle;
use super::state::{
    EntityKind, Facing, GameState, Motion, ObstacleKind, POWERUP_HITBOX_EXPANSION, POWERUP_SCALE,
    PowerUpKind, SPECIAL_POWERUP_HITBOX_EXPANSION, SPECIAL_POWERUP_SCALE,
};
use super::timers::TimerEvent;
use crate::assets::texture_for;
use crate::consts::*;
use crate::tuning::{SpawnTuning, Tuning};
use crate::world_center_x;

/// Altitude band; decides which kinds may spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvZone {
    NearGround,
    Sky,
    UpperAtmosphere,
    Exosphere,
}

impl EnvZone {
    pub fn from_altitude(altitude: u32) -> Self {
        match altitude {
            0..1000 => EnvZone::NearGround,
            1000..3000 => EnvZone::Sky,
            3000..6000 => EnvZone::UpperAtmosphere,
            _ => EnvZone::Exosphere,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvZone::NearGround => "near_ground",
            EnvZone::Sky => "sky",
            EnvZone::UpperAtmosphere => "upper_atmosphere",
            EnvZone::Exosphere => "exosphere",
        }
    }

    pub fn obstacles(&self) -> &'static [ObstacleKind] {
        use ObstacleKind::*;
        match self {
            EnvZone::NearGround => &[Bird, Airplane],
            EnvZone::Sky => &[Bird, Airplane, Ufo],
            EnvZone::UpperAtmosphere => &[Airplane, Ufo],
            EnvZone::Exosphere => &[Ufo],
        }
    }

    pub fn powerups(&self) -> &'static [PowerUpKind] {
        use PowerUpKind::*;
        match self {
            EnvZone::NearGround => &[Fuel, Shield, Wind],
            EnvZone::Sky => &[Fuel, Shield, Thermal, Wind],
            EnvZone::UpperAtmosphere => &[Fuel, Shield, Thermal, Turbo],
            EnvZone::Exosphere => &[Fuel, Turbo],
        }
    }

    /// Upper two bands get more frequent power-ups
    pub fn is_high(&self) -> bool {
        matches!(self, EnvZone::UpperAtmosphere | EnvZone::Exosphere)
    }
}

/// Obstacle formations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveKind {
    V,
    Wall,
    Spiral,
    Scatter,
    Funnel,
}

impl WaveKind {
    pub const ALL: [WaveKind; 5] = [
        WaveKind::V,
        WaveKind::Wall,
        WaveKind::Spiral,
        WaveKind::Scatter,
        WaveKind::Funnel,
    ];

    pub fn weight(&self) -> f32 {
        match self {
            WaveKind::V | WaveKind::Scatter => 0.25,
            WaveKind::Wall => 0.20,
            WaveKind::Spiral | WaveKind::Funnel => 0.15,
        }
    }

    /// Obstacle positions for one batch, relative to the balloon
    pub fn positions<R: Rng>(&self, rng: &mut R, balloon: Vec2, margin: f32) -> Vec<Vec2> {
        let cx = world_center_x();
        match self {
            WaveKind::V => (0..5)
                .map(|i| {
                    let step = i as f32 - 2.0;
                    Vec2::new(cx + step * 80.0, balloon.y - 600.0 - step.abs() * 40.0)
                })
                .collect(),
            WaveKind::Wall => {
                let gap = rng.random_range(1..=4);
                let spacing = WORLD_WIDTH / 6.0;
                (0..6)
                    .filter(|i| *i != gap)
                    .map(|i| Vec2::new(spacing * i as f32 + spacing / 2.0, balloon.y - 600.0))
                    .collect()
            }
            WaveKind::Spiral => (0..8)
                .map(|i| {
                    let angle = i as f32 / 8.0 * std::f32::consts::TAU;
                    Vec2::new(
                        cx + angle.cos() * 120.0,
                        balloon.y - 500.0 + angle.sin() * 60.0,
                    )
                })
                .collect(),
            WaveKind::Scatter => {
                let count = rng.random_range(3..=6);
                (0..count)
                    .map(|_| {
                        Vec2::new(
                            rng.random_range(margin..=WORLD_WIDTH - margin),
                            balloon.y - rng.random_range(400.0..=800.0),
                        )
                    })
                    .filter(|p| (p.x - balloon.x).abs() > 100.0)
                    .collect()
            }
            WaveKind::Funnel => (0..4)
                .flat_map(|row| {
                    let t = row as f32 / 3.0;
                    let y = balloon.y - 700.0 + 300.0 * t;
                    let half = (200.0 - 120.0 * t) / 2.0;
                    [Vec2::new(cx - half, y), Vec2::new(cx + half, y)]
                })
                .collect(),
        }
    }
}

/// An active formation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavePattern {
    pub kind: WaveKind,
    pub started_at: f32,
    pub ends_at: f32,
}

/// Short-lived special zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    /// Extra obstacles plus a delayed turbo reward
    Danger,
    /// Cluster of fuel power-ups
    Bonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecialZone {
    pub id: u32,
    pub kind: ZoneKind,
    /// Top edge and height of the band in world space
    pub top: f32,
    pub height: f32,
}

/// Spawn bookkeeping for one run
#[derive(Debug, Clone)]
pub struct SpawnDirector {
    pub last_obstacle_at: f32,
    pub last_powerup_at: f32,
    pub wave: Option<WavePattern>,
    /// Rolling lateral movement intensity samples in [0, 1]
    movement: VecDeque<f32>,
    pub zone: EnvZone,
    pub zones: Vec<SpecialZone>,
    next_zone_id: u32,
}

impl SpawnDirector {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            last_obstacle_at: 0.0,
            last_powerup_at: 0.0,
            wave: None,
            movement: VecDeque::with_capacity(tuning.spawn.movement_history),
            zone: EnvZone::NearGround,
            zones: Vec::new(),
            next_zone_id: 0,
        }
    }

    /// Restart spawn cadence from `now`
    pub fn reset_clocks(&mut self, now: f32) {
        self.last_obstacle_at = now;
        self.last_powerup_at = now;
    }

    pub fn record_movement(&mut self, intensity: f32, history: usize) {
        self.movement.push_back(intensity.clamp(0.0, 1.0));
        while self.movement.len() > history.max(1) {
            self.movement.pop_front();
        }
    }

    pub fn average_movement(&self) -> f32 {
        if self.movement.is_empty() {
            return 0.0;
        }
        self.movement.iter().sum::<f32>() / self.movement.len() as f32
    }

    /// Seconds between obstacle spawns
    pub fn obstacle_interval(&self, level: u32, s: &SpawnTuning) -> f32 {
        let avg = self.average_movement();
        let mut base = s.obstacle_base_interval;
        if avg > s.active_threshold {
            base *= s.active_factor;
        } else if avg < s.passive_threshold {
            base *= s.passive_factor;
        }
        (base - level as f32 * s.obstacle_level_step).max(s.interval_floor)
    }

    /// Seconds between power-up spawns
    pub fn powerup_interval(&self, level: u32, s: &SpawnTuning) -> f32 {
        let mut base = s.powerup_base_interval;
        if self.zone.is_high() {
            base *= s.powerup_high_zone_factor;
        }
        (base + level as f32 * s.powerup_level_step).max(s.interval_floor)
    }

    pub fn clear_zones(&mut self) {
        self.zones.clear();
        self.wave = None;
    }

    fn special_zone(&self, id: u32) -> Option<&SpecialZone> {
        self.zones.iter().find(|z| z.id == id)
    }
}

/// Chance per frame of `dt` seconds for an event with `chance` per nominal frame
pub fn frame_chance(chance: f64, dt: f32) -> f64 {
    let frames = f64::from(dt.max(0.0)) / f64::from(NOMINAL_DT);
    (1.0 - (1.0 - chance.clamp(0.0, 1.0)).powf(frames)).clamp(0.0, 1.0)
}

/// Per-tick spawn manager
pub fn run_spawner(state: &mut GameState, dt: f32) {
    update_env_zone(state);
    manage_wave(state, dt);

    let now = state.now();
    let level = state.difficulty.level;

    let interval = state.spawner.obstacle_interval(level, &state.tuning.spawn);
    if now - state.spawner.last_obstacle_at > interval {
        match state.spawner.wave {
            Some(wave) => {
                spawn_wave(state, wave.kind);
            }
            None => {
                spawn_obstacle(state);
            }
        }
        state.spawner.last_obstacle_at = now;
    }

    let interval = state.spawner.powerup_interval(level, &state.tuning.spawn);
    if now - state.spawner.last_powerup_at > interval {
        spawn_powerup(state);
        state.spawner.last_powerup_at = now;
    }

    let zone_chance = frame_chance(state.tuning.spawn.zone_chance, dt);
    if state.rng.random_bool(zone_chance) {
        let kind = if state.rng.random_bool(0.5) {
            ZoneKind::Danger
        } else {
            ZoneKind::Bonus
        };
        start_special_zone(state, kind);
    }
}

/// Track the altitude band and announce changes
pub fn update_env_zone(state: &mut GameState) {
    let zone = EnvZone::from_altitude(state.session.altitude);
    if zone != state.spawner.zone {
        log::info!("Entered {}", zone.as_str());
        state.spawner.zone = zone;
        state.emit(GameEvent::Feedback(Feedback::ZoneTransition(zone)));
    }
}

fn manage_wave(state: &mut GameState, dt: f32) {
    let now = state.now();
    if let Some(wave) = state.spawner.wave {
        if now >= wave.ends_at {
            log::debug!("Wave {:?} finished", wave.kind);
            state.spawner.wave = None;
        }
    }
    let wave_chance = frame_chance(state.tuning.spawn.wave_chance, dt);
    if state.spawner.wave.is_some() || !state.rng.random_bool(wave_chance) {
        return;
    }

    let kind = WaveKind::ALL
        .choose_weighted(&mut state.rng, |k| k.weight())
        .copied()
        .unwrap_or(WaveKind::Scatter);
    let s = &state.tuning.spawn;
    let duration = state
        .rng
        .random_range(s.wave_min_duration..=s.wave_max_duration);
    state.spawner.wave = Some(WavePattern {
        kind,
        started_at: now,
        ends_at: now + duration,
    });
    log::info!("Wave {kind:?} for {duration:.1}s");
    state.emit(GameEvent::Feedback(Feedback::WaveStarted(kind)));
}

/// Place one batch of the current formation
pub fn spawn_wave(state: &mut GameState, kind: WaveKind) -> usize {
    let margin = state.tuning.spawn.margin;
    let positions = kind.positions(&mut state.rng, state.balloon.pos, margin);
    let mut spawned = 0;
    for pos in positions {
        let kind = pick_obstacle(state);
        if spawn_obstacle_at(state, kind, pos, true).is_some() {
            spawned += 1;
        }
    }
    spawned
}

/// Single obstacle at a safe horizontal distance from the balloon
pub fn spawn_obstacle(state: &mut GameState) -> Option<EntityHandle> {
    let s = &state.tuning.spawn;
    let (margin, safe_radius, retries) = (s.margin, s.safe_radius, s.max_spawn_retries);
    let y = state.balloon.pos.y - s.obstacle_offset - state.rng.random_range(0.0..=s.obstacle_jitter);

    let balloon_x = state.balloon.pos.x;
    let mut x = state.rng.random_range(margin..=WORLD_WIDTH - margin);
    for _ in 0..retries {
        if (x - balloon_x).abs() >= safe_radius {
            break;
        }
        x = state.rng.random_range(margin..=WORLD_WIDTH - margin);
    }

    let kind = pick_obstacle(state);
    spawn_obstacle_at(state, kind, Vec2::new(x, y), false)
}

/// Weighted obstacle choice restricted to the current band. Used for single
/// spawns, formations and danger zones alike.
fn pick_obstacle(state: &mut GameState) -> ObstacleKind {
    state
        .spawner
        .zone
        .obstacles()
        .choose_weighted(&mut state.rng, |k| k.weight())
        .copied()
        .unwrap_or(ObstacleKind::Bird)
}

/// Configure and activate an obstacle at `pos`
pub fn spawn_obstacle_at(
    state: &mut GameState,
    kind: ObstacleKind,
    pos: Vec2,
    wave_spawned: bool,
) -> Option<EntityHandle> {
    let margin = state.tuning.spawn.margin;
    let pos = crate::clamp_to_columns(pos, margin);
    let speed = state.speed_multiplier();
    let now = state.now();

    let (vx, motion) = match kind {
        ObstacleKind::Bird => (
            state.rng.random_range(-60.0..=60.0) * speed,
            Motion::Bob {
                anchor_y: pos.y,
                offset: state.rng.random_range(-30.0..=30.0),
                half_period: 2.0,
                started_at: now,
            },
        ),
        ObstacleKind::Airplane => (state.rng.random_range(-120.0..=120.0) * speed, Motion::Drift),
        ObstacleKind::Ufo => (0.0, Motion::Jitter { next_at: now + 1.0 }),
    };

    let entity_kind = EntityKind::Obstacle(kind);
    let facing = if pos.x > world_center_x() {
        Facing::Right
    } else {
        Facing::Left
    };
    let texture = texture_for(state.assets.as_ref(), entity_kind, facing);

    let Some(handle) = state.pool.acquire(entity_kind) else {
        log::debug!("Pool full, skipped {kind}");
        return None;
    };
    let (scale, hit_w, hit_h) = kind.config();
    if let Some(e) = state.pool.get_mut(handle) {
        e.pos = pos;
        e.vel = Vec2::new(vx, 0.0);
        e.scale = scale;
        e.hitbox_fraction = Vec2::new(hit_w, hit_h);
        e.motion = motion;
        e.facing = facing;
        e.texture = texture;
        e.wave_spawned = wave_spawned;
    }
    log::debug!("Spawned {kind} at ({:.0}, {:.0})", pos.x, pos.y);
    Some(handle)
}

/// Regular power-up ahead of the balloon
pub fn spawn_powerup(state: &mut GameState) -> Option<EntityHandle> {
    let s = &state.tuning.spawn;
    let margin = s.margin;
    let y = state.balloon.pos.y - s.powerup_offset - state.rng.random_range(0.0..=s.powerup_jitter);
    let x = state.rng.random_range(margin..=WORLD_WIDTH - margin);
    let kind = state
        .spawner
        .zone
        .powerups()
        .choose(&mut state.rng)
        .copied()
        .unwrap_or(PowerUpKind::Fuel);
    spawn_powerup_at(state, kind, Vec2::new(x, y), false)
}

/// Configure and activate a power-up; zone rewards are `special`
pub fn spawn_powerup_at(
    state: &mut GameState,
    kind: PowerUpKind,
    pos: Vec2,
    special: bool,
) -> Option<EntityHandle> {
    let entity_kind = EntityKind::PowerUp(kind);
    let texture = texture_for(state.assets.as_ref(), entity_kind, Facing::Left);
    let now = state.now();
    let handle = state.pool.acquire(entity_kind)?;

    let (scale, expansion) = if special {
        (SPECIAL_POWERUP_SCALE, SPECIAL_POWERUP_HITBOX_EXPANSION)
    } else {
        (POWERUP_SCALE, POWERUP_HITBOX_EXPANSION)
    };
    if let Some(e) = state.pool.get_mut(handle) {
        e.pos = pos;
        e.vel = Vec2::ZERO;
        e.scale = scale;
        e.hitbox_fraction = Vec2::splat(expansion);
        e.motion = Motion::Bob {
            anchor_y: pos.y,
            offset: -15.0,
            half_period: 1.0,
            started_at: now,
        };
        e.texture = texture;
        e.special = special;
    }
    log::debug!("Spawned {} power-up at ({:.0}, {:.0})", kind.as_str(), pos.x, pos.y);
    Some(handle)
}

/// Open a danger or bonus zone ahead of the balloon
pub fn start_special_zone(state: &mut GameState, kind: ZoneKind) -> Option<u32> {
    if kind == ZoneKind::Danger && state.spawner.zones.iter().any(|z| z.kind == ZoneKind::Danger) {
        return None;
    }

    let id = state.spawner.next_zone_id;
    state.spawner.next_zone_id = id.wrapping_add(1);
    let s = state.tuning.spawn.clone();
    let by = state.balloon.pos.y;

    let zone = match kind {
        ZoneKind::Danger => {
            let zone = SpecialZone {
                id,
                kind,
                top: by - 500.0,
                height: 150.0,
            };
            for _ in 0..4 {
                let x = state.rng.random_range(s.margin..=WORLD_WIDTH - s.margin);
                let y = zone.top + state.rng.random_range(0.0..=zone.height);
                let obstacle = pick_obstacle(state);
                spawn_obstacle_at(state, obstacle, Vec2::new(x, y), true);
            }
            state
                .timers
                .after(s.danger_reward_delay, TimerEvent::DangerReward { zone: id });
            state
                .timers
                .after(s.danger_zone_duration, TimerEvent::ZoneExpired { zone: id });
            zone
        }
        ZoneKind::Bonus => {
            let zone = SpecialZone {
                id,
                kind,
                top: by - 400.0,
                height: 100.0,
            };
            for _ in 0..3 {
                let x = state.rng.random_range(100.0..=WORLD_WIDTH - 100.0);
                let y = zone.top + state.rng.random_range(20.0..=zone.height - 20.0);
                spawn_powerup_at(state, PowerUpKind::Fuel, Vec2::new(x, y), true);
            }
            state
                .timers
                .after(s.bonus_zone_duration, TimerEvent::ZoneExpired { zone: id });
            zone
        }
    };

    log::info!("{kind:?} zone {id} opened");
    state.spawner.zones.push(zone);
    state.emit(GameEvent::Feedback(Feedback::SpecialZone(kind)));
    Some(id)
}

/// Danger zone reward: a special turbo in the middle of the band
pub fn on_danger_reward(state: &mut GameState, zone: u32) {
    let Some(z) = state.spawner.special_zone(zone).copied() else {
        return;
    };
    let x = state.rng.random_range(100.0..=WORLD_WIDTH - 100.0);
    spawn_powerup_at(state, PowerUpKind::Turbo, Vec2::new(x, z.top + z.height / 2.0), true);
}

pub fn on_zone_expired(state: &mut GameState, zone: u32) {
    let before = state.spawner.zones.len();
    state.spawner.zones.retain(|z| z.id != zone);
    if state.spawner.zones.len() != before {
        log::debug!("Zone {zone} expired");
    }
}

/// Advance entity motion, including periodic UFO jitter
pub fn update_entities(state: &mut GameState, dt: f32) {
    let now = state.now();
    let speed = state.speed_multiplier();
    let rng = &mut state.rng;
    for e in state.pool.iter_active_mut() {
        if let Motion::Jitter { next_at } = e.motion {
            if now >= next_at {
                e.vel.x = rng.random_range(-100.0..=100.0) * speed;
                if rng.random_bool(0.15) {
                    e.pos.x = rng.random_range(50.0..=WORLD_WIDTH - 50.0);
                }
                e.motion = Motion::Jitter { next_at: next_at + 1.0 };
            }
        }
        e.advance(dt, now);
    }
}

/// Recycle entities that left the window around the balloon
pub fn cleanup(state: &mut GameState) -> usize {
    let by = state.balloon.pos.y;
    let top = by - state.tuning.spawn.cleanup_above;
    let bottom = by + state.tuning.spawn.cleanup_below;
    let stale: Vec<EntityHandle> = state
        .pool
        .iter_active()
        .filter(|(_, e)| e.pos.y < top || e.pos.y > bottom)
        .map(|(h, _)| h)
        .collect();
    stale.into_iter().filter(|h| state.pool.release(*h)).count()
}
