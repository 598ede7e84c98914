//! Data-driven game balance
//!
//! Every number the simulation uses to decide "how much" or "how often" lives
//! here. Defaults reproduce the shipped balance; hosts may override any subset
//! from JSON (missing fields keep their defaults).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a tuning override
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tuning value out of range: {0}")]
    OutOfRange(&'static str),
}

/// Balloon physics parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsTuning {
    /// Base lift (px/s) at full fuel and nominal efficiency
    pub base_buoyancy: f32,
    /// Velocity multiplier applied per nominal frame (< 1)
    pub air_resistance: f32,
    /// Smoothing rate toward target vertical velocity (per second)
    pub smoothing_rate: f32,
    /// Downward acceleration when out of fuel (px/s²)
    pub gravity: f32,
    /// Maximum fall speed (px/s)
    pub terminal_velocity: f32,
    /// Lateral deceleration toward zero (px/s²)
    pub drag_x: f32,
    /// Velocity caps (px/s)
    pub max_velocity_x: f32,
    pub max_velocity_y: f32,
    /// Discrete swipe/button impulse (px/s) and its fuel cost
    pub swipe_impulse: f32,
    pub swipe_fuel_cost: f32,
    /// Continuous drag: velocity = delta * gain, clamped to max
    pub drag_gain: f32,
    pub drag_max_impulse: f32,
    /// Fuel cost at full drag intensity (|delta| >= 100)
    pub drag_fuel_cost: f32,
    /// Drag delta applied per nominal frame while a direction is held
    pub hold_drag_delta: f32,
    /// Pointer drags smaller than this accumulate instead of moving
    pub drag_threshold: f32,
}

impl Default for PhysicsTuning {
    fn default() -> Self {
        Self {
            base_buoyancy: 80.0,
            air_resistance: 0.98,
            smoothing_rate: 2.0,
            gravity: 100.0,
            terminal_velocity: 150.0,
            drag_x: 200.0,
            max_velocity_x: 200.0,
            max_velocity_y: 300.0,
            swipe_impulse: 120.0,
            swipe_fuel_cost: 0.3,
            drag_gain: 2.0,
            drag_max_impulse: 150.0,
            drag_fuel_cost: 0.15,
            hold_drag_delta: 80.0,
            drag_threshold: 30.0,
        }
    }
}

/// Spawn cadence and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Obstacle interval (seconds) and per-level reduction
    pub obstacle_base_interval: f32,
    pub obstacle_level_step: f32,
    /// Power-up interval (seconds) and per-level increase
    pub powerup_base_interval: f32,
    pub powerup_level_step: f32,
    /// Power-up interval multiplier in the upper two zones
    pub powerup_high_zone_factor: f32,
    /// No spawn interval may drop below this (seconds)
    pub interval_floor: f32,
    /// Average movement intensity above/below which the player counts as active/passive
    pub active_threshold: f32,
    pub passive_threshold: f32,
    pub active_factor: f32,
    pub passive_factor: f32,
    /// Rolling movement history length (samples)
    pub movement_history: usize,
    /// Lateral speed that maps to intensity 1.0
    pub movement_normalizer: f32,
    /// Horizontal margin kept clear at the world edges
    pub margin: f32,
    /// Obstacles never spawn horizontally closer than this to the balloon
    pub safe_radius: f32,
    /// Bounded retries for the safe-x search
    pub max_spawn_retries: u32,
    /// Obstacle spawn height above the balloon, plus jitter
    pub obstacle_offset: f32,
    pub obstacle_jitter: f32,
    /// Power-up spawn height above the balloon, plus jitter
    pub powerup_offset: f32,
    pub powerup_jitter: f32,
    /// Chance per nominal 1/60 s frame of starting a wave pattern (scaled by Δt)
    pub wave_chance: f64,
    /// Wave duration range (seconds)
    pub wave_min_duration: f32,
    pub wave_max_duration: f32,
    /// Chance per nominal 1/60 s frame of an environmental zone (scaled by Δt)
    pub zone_chance: f64,
    pub danger_zone_duration: f32,
    pub danger_reward_delay: f32,
    pub bonus_zone_duration: f32,
    /// Entities further than this above / below the balloon are recycled
    pub cleanup_above: f32,
    pub cleanup_below: f32,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            obstacle_base_interval: 2.0,
            obstacle_level_step: 0.12,
            powerup_base_interval: 4.0,
            powerup_level_step: 0.2,
            powerup_high_zone_factor: 0.7,
            interval_floor: 0.6,
            active_threshold: 0.7,
            passive_threshold: 0.3,
            active_factor: 0.8,
            passive_factor: 1.2,
            movement_history: 100,
            movement_normalizer: 200.0,
            margin: 60.0,
            safe_radius: 120.0,
            max_spawn_retries: 16,
            obstacle_offset: 800.0,
            obstacle_jitter: 300.0,
            powerup_offset: 400.0,
            powerup_jitter: 150.0,
            wave_chance: 0.002,
            wave_min_duration: 3.0,
            wave_max_duration: 7.0,
            zone_chance: 0.003,
            danger_zone_duration: 8.0,
            danger_reward_delay: 1.0,
            bonus_zone_duration: 6.0,
            cleanup_above: 1200.0,
            cleanup_below: 400.0,
        }
    }
}

/// Score awards, combo and difficulty progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    /// Points per altitude unit gained (times difficulty level)
    pub altitude_points: u64,
    /// Survival bonus kicks in after this many seconds
    pub survival_threshold: f32,
    /// Survival bonus = floor(elapsed / divisor)
    pub survival_divisor: f32,
    pub shield_deflect_bonus: u64,
    pub first_level_up: u64,
    pub level_up_step: u64,
    /// Obstacle speeds scale by 1 + (level - 1) * this
    pub speed_per_level: f32,
    pub combo_window: f32,
    pub combo_step: f32,
    pub combo_cap: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            altitude_points: 10,
            survival_threshold: 30.0,
            survival_divisor: 10.0,
            shield_deflect_bonus: 50,
            first_level_up: 1000,
            level_up_step: 1500,
            speed_per_level: 0.4,
            combo_window: 3.0,
            combo_step: 0.5,
            combo_cap: 3.0,
        }
    }
}

/// Power-up effect strengths and durations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffTuning {
    pub fuel_restore: f32,
    pub fuel_boost_lift: f32,
    pub fuel_boost_duration: f32,
    pub shield_duration: f32,
    pub thermal_lift: f32,
    pub thermal_buoyancy: f32,
    pub thermal_duration: f32,
    pub wind_impulse: f32,
    pub wind_duration: f32,
    pub turbo_lift: f32,
    pub turbo_buoyancy: f32,
    pub turbo_duration: f32,
    /// Caps on the stacked multipliers
    pub max_lift_efficiency: f32,
    pub max_buoyancy_multiplier: f32,
}

impl Default for BuffTuning {
    fn default() -> Self {
        Self {
            fuel_restore: 30.0,
            fuel_boost_lift: 2.0,
            fuel_boost_duration: 3.0,
            shield_duration: 5.0,
            thermal_lift: 3.0,
            thermal_buoyancy: 1.5,
            thermal_duration: 5.0,
            wind_impulse: 60.0,
            wind_duration: 4.0,
            turbo_lift: 4.0,
            turbo_buoyancy: 2.0,
            turbo_duration: 3.0,
            max_lift_efficiency: 6.0,
            max_buoyancy_multiplier: 3.0,
        }
    }
}

/// Complete balance sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub physics: PhysicsTuning,
    pub spawn: SpawnTuning,
    pub scoring: ScoringTuning,
    pub buffs: BuffTuning,
    /// Countdown start value (one step per second)
    pub countdown_from: u8,
    /// Number of pooled entities created per class before play starts
    pub pool_prewarm: usize,
    /// Hard cap on simultaneously active entities
    pub max_active_entities: usize,
}

impl Tuning {
    /// Parse overrides from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.physics;
        if !(p.air_resistance > 0.0 && p.air_resistance < 1.0) {
            return Err(TuningError::OutOfRange("physics.air_resistance"));
        }
        if p.terminal_velocity <= 0.0 {
            return Err(TuningError::OutOfRange("physics.terminal_velocity"));
        }
        let s = &self.spawn;
        if !(s.interval_floor > 0.0) {
            return Err(TuningError::OutOfRange("spawn.interval_floor"));
        }
        // Used as sampling ranges and timer delays: must be finite and >= 0
        let lengths = [
            (s.obstacle_offset, "spawn.obstacle_offset"),
            (s.obstacle_jitter, "spawn.obstacle_jitter"),
            (s.powerup_offset, "spawn.powerup_offset"),
            (s.powerup_jitter, "spawn.powerup_jitter"),
            (s.safe_radius, "spawn.safe_radius"),
            (s.wave_min_duration, "spawn.wave_min_duration"),
            (s.wave_max_duration, "spawn.wave_max_duration"),
            (s.danger_zone_duration, "spawn.danger_zone_duration"),
            (s.danger_reward_delay, "spawn.danger_reward_delay"),
            (s.bonus_zone_duration, "spawn.bonus_zone_duration"),
            (s.cleanup_below, "spawn.cleanup_below"),
            (s.margin, "spawn.margin"),
        ];
        if let Some((_, name)) = lengths.iter().find(|(v, _)| !(v.is_finite() && *v >= 0.0)) {
            return Err(TuningError::OutOfRange(*name));
        }
        if s.wave_min_duration > s.wave_max_duration {
            return Err(TuningError::OutOfRange("spawn.wave_min_duration"));
        }
        if !(0.0..=1.0).contains(&s.wave_chance) {
            return Err(TuningError::OutOfRange("spawn.wave_chance"));
        }
        if !(0.0..=1.0).contains(&s.zone_chance) {
            return Err(TuningError::OutOfRange("spawn.zone_chance"));
        }
        if s.cleanup_above <= s.obstacle_offset + s.obstacle_jitter {
            return Err(TuningError::OutOfRange("spawn.cleanup_above"));
        }
        if s.margin * 2.0 >= crate::consts::WORLD_WIDTH {
            return Err(TuningError::OutOfRange("spawn.margin"));
        }
        if self.scoring.combo_cap < 1.0 {
            return Err(TuningError::OutOfRange("scoring.combo_cap"));
        }
        if self.max_active_entities == 0 {
            return Err(TuningError::OutOfRange("max_active_entities"));
        }
        Ok(())
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            physics: PhysicsTuning::default(),
            spawn: SpawnTuning::default(),
            scoring: ScoringTuning::default(),
            buffs: BuffTuning::default(),
            countdown_from: 3,
            pool_prewarm: 10,
            max_active_entities: 96,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{"physics": {"base_buoyancy": 120.0}}"#).unwrap();
        assert_eq!(tuning.physics.base_buoyancy, 120.0);
        assert_eq!(tuning.physics.air_resistance, 0.98);
        assert_eq!(tuning.countdown_from, 3);
        assert_eq!(tuning.max_active_entities, 96);
    }

    #[test]
    fn test_rejects_bad_air_resistance() {
        let err = Tuning::from_json(r#"{"physics": {"air_resistance": 1.5}}"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange("physics.air_resistance")));
    }

    #[test]
    fn test_rejects_negative_jitter() {
        let err = Tuning::from_json(r#"{"spawn": {"powerup_jitter": -5.0}}"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange("spawn.powerup_jitter")));
        let err = Tuning::from_json(r#"{"spawn": {"obstacle_jitter": -1.0}}"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange("spawn.obstacle_jitter")));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            Tuning::from_json("{ nope"),
            Err(TuningError::Json(_))
        ));
    }
}
