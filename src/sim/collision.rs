//! Collision detection and effects
//!
//! Hitboxes are axis-aligned and centered on the sprite. Obstacles shrink
//! theirs below the visual size so near misses feel fair; power-ups enlarge
//! theirs so pickups are forgiving.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::events::{EndReason, Feedback, GameEvent};
use super::physics::BuffKind;
use super::run::end_run;
use super::scoring::register_combo;
use super::state::{EntityKind, GameState, PoolClass, PowerUpKind};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Strict overlap; touching edges do not count
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Resolve balloon overlaps for this tick. Returns true if the run ended.
pub fn resolve_collisions(state: &mut GameState) -> bool {
    let balloon_box = state.balloon.hitbox();

    // Obstacles first: a lethal hit wins over a same-frame pickup
    for handle in state.pool.active_handles(PoolClass::Obstacle) {
        let Some(entity) = state.pool.get(handle) else {
            continue;
        };
        if !entity.hitbox().overlaps(&balloon_box) {
            continue;
        }
        let EntityKind::Obstacle(kind) = entity.kind else {
            continue;
        };
        let pos = entity.pos;

        if state.shield_active() {
            let bonus = state.tuning.scoring.shield_deflect_bonus;
            state.pool.release(handle);
            state.session.score += bonus;
            log::debug!("Shield deflected {kind}");
            state.emit(GameEvent::Feedback(Feedback::Deflect { pos, kind, bonus }));
            state.emit(GameEvent::Feedback(Feedback::CameraShake(0.3)));
        } else {
            log::info!("Balloon hit by {kind}");
            state.emit(GameEvent::Feedback(Feedback::DamageBurst {
                pos: state.balloon.pos,
            }));
            state.emit(GameEvent::Feedback(Feedback::CameraShake(1.0)));
            state.emit(GameEvent::Feedback(Feedback::Haptic(200)));
            end_run(state, EndReason::HitBy(kind));
            return true;
        }
    }

    for handle in state.pool.active_handles(PoolClass::PowerUp) {
        let Some(entity) = state.pool.get(handle) else {
            continue;
        };
        if !entity.hitbox().overlaps(&balloon_box) {
            continue;
        }
        let EntityKind::PowerUp(kind) = entity.kind else {
            continue;
        };
        let pos = entity.pos;
        state.pool.release(handle);
        collect_powerup(state, kind, pos);
    }

    false
}

/// Apply a power-up's effect and award its points times the combo multiplier
pub fn collect_powerup(state: &mut GameState, kind: PowerUpKind, pos: Vec2) {
    let now = state.now();
    let multiplier = register_combo(&mut state.session, now, &state.tuning.scoring);
    let count = state.session.combo_count;
    if count > 1 {
        state.emit(GameEvent::Feedback(Feedback::ComboPopup { count, multiplier }));
    }

    let buffs = state.tuning.buffs.clone();
    let buff = match kind {
        PowerUpKind::Fuel => {
            state.balloon.refuel(buffs.fuel_restore);
            BuffKind::FuelBoost
        }
        PowerUpKind::Shield => BuffKind::Shield,
        PowerUpKind::Thermal => BuffKind::Thermal,
        PowerUpKind::Turbo => BuffKind::Turbo,
        PowerUpKind::Wind => {
            let direction = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
            state
                .balloon
                .apply_wind(direction, &buffs, &state.tuning.physics);
            BuffKind::Wind
        }
    };
    state
        .balloon
        .activate_buff(buff, &mut state.timers, &buffs);
    state.emit(GameEvent::Feedback(Feedback::BuffStarted(buff)));

    let points = (kind.base_points() as f32 * multiplier).floor() as u64;
    state.session.score += points;
    log::debug!("Collected {} for {points} (x{multiplier})", kind.as_str());
    state.emit(GameEvent::Feedback(Feedback::CollectionBurst { pos, kind, points }));
    state.emit(GameEvent::Feedback(Feedback::Haptic(30)));
}
