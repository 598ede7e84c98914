//! Balloon physics
//!
//! Fuel and active buffs become vertical buoyancy; control intents become
//! lateral velocity. Screen coordinates: negative `vel.y` is upward.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::timers::{TimerEvent, TimerId, Timers};
use crate::consts::*;
use crate::lerp;
use crate::tuning::{BuffTuning, PhysicsTuning};

/// Balloon sprite: unscaled size, scale, and hitbox fraction
pub const BALLOON_SPRITE: Vec2 = Vec2::new(200.0, 260.0);
pub const BALLOON_SCALE: f32 = 0.3;
pub const BALLOON_HITBOX: Vec2 = Vec2::new(0.6, 0.75);

pub const MAX_FUEL: f32 = 100.0;

/// Lateral control direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(&self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }
}

/// Timed balloon modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffKind {
    Shield,
    FuelBoost,
    Thermal,
    Wind,
    Turbo,
}

impl BuffKind {
    /// (lift efficiency multiplier, buoyancy multiplier) while active
    pub fn multipliers(&self, tuning: &BuffTuning) -> (f32, f32) {
        match self {
            BuffKind::FuelBoost => (tuning.fuel_boost_lift, 1.0),
            BuffKind::Thermal => (tuning.thermal_lift, tuning.thermal_buoyancy),
            BuffKind::Turbo => (tuning.turbo_lift, tuning.turbo_buoyancy),
            BuffKind::Shield | BuffKind::Wind => (1.0, 1.0),
        }
    }

    pub fn duration(&self, tuning: &BuffTuning) -> f32 {
        match self {
            BuffKind::Shield => tuning.shield_duration,
            BuffKind::FuelBoost => tuning.fuel_boost_duration,
            BuffKind::Thermal => tuning.thermal_duration,
            BuffKind::Wind => tuning.wind_duration,
            BuffKind::Turbo => tuning.turbo_duration,
        }
    }
}

/// An active buff and the timer that ends it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    pub kind: BuffKind,
    pub expires_at: f32,
    pub timer: TimerId,
}

/// The player's balloon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balloon {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Fuel in [0, 100]
    pub fuel: f32,
    pub buffs: Vec<ActiveBuff>,
    /// Lift efficiency (1.0 nominal)
    pub lift_efficiency: f32,
    /// Multiplier on base buoyancy (1.0 nominal)
    pub buoyancy_multiplier: f32,
    /// Active wind current: -1 left, 0 none, 1 right
    pub wind_direction: f32,
    /// Smallest y reached (highest point)
    pub peak_y: f32,
    /// Starting y, altitude is measured from here
    pub origin_y: f32,
}

impl Default for Balloon {
    fn default() -> Self {
        Self::new()
    }
}

impl Balloon {
    pub fn new() -> Self {
        Self {
            pos: Vec2::new(BALLOON_START_X, BALLOON_START_Y),
            vel: Vec2::ZERO,
            fuel: MAX_FUEL,
            buffs: Vec::new(),
            lift_efficiency: 1.0,
            buoyancy_multiplier: 1.0,
            wind_direction: 0.0,
            peak_y: BALLOON_START_Y,
            origin_y: BALLOON_START_Y,
        }
    }

    /// Collision box
    pub fn hitbox(&self) -> Aabb {
        Aabb::from_center(self.pos, BALLOON_SPRITE * BALLOON_SCALE * BALLOON_HITBOX)
    }

    /// Maximum upward displacement from the start, in pixels
    pub fn max_displacement(&self) -> f32 {
        (self.origin_y - self.peak_y).max(0.0)
    }

    /// Integrate one step of `dt` seconds
    pub fn integrate(&mut self, dt: f32, p: &PhysicsTuning) {
        if dt <= 0.0 {
            return;
        }
        let damping = p.air_resistance.powf(dt / NOMINAL_DT);

        if self.fuel > 0.0 {
            let effective =
                p.base_buoyancy * self.buoyancy_multiplier * (self.fuel / MAX_FUEL) * self.lift_efficiency;
            let target = self.vel.y - effective;
            let t = (dt * p.smoothing_rate).min(1.0);
            self.vel.y = lerp(self.vel.y, target, t) * damping;
        } else {
            let falling = (self.vel.y + p.gravity * dt) * damping;
            self.vel.y = falling.min(p.terminal_velocity);
        }
        self.vel.y = self.vel.y.clamp(-p.max_velocity_y, p.max_velocity_y);

        // Lateral drag toward zero
        let speed_x = (self.vel.x.abs() - p.drag_x * dt).max(0.0);
        self.vel.x = (speed_x * self.vel.x.signum()).clamp(-p.max_velocity_x, p.max_velocity_x);

        self.pos += self.vel * dt;

        // World bounds (horizontal)
        let half_w = BALLOON_SPRITE.x * BALLOON_SCALE * 0.5;
        let clamped = self.pos.x.clamp(half_w, WORLD_WIDTH - half_w);
        if clamped != self.pos.x {
            self.pos.x = clamped;
            self.vel.x = 0.0;
        }

        self.peak_y = self.peak_y.min(self.pos.y);
        self.sanitize();
    }

    /// Discrete swipe/button press: fixed impulse, fixed fuel cost
    pub fn swipe(&mut self, dir: Direction, p: &PhysicsTuning) -> bool {
        self.lateral(dir.sign() * p.swipe_impulse, p.swipe_fuel_cost)
    }

    /// Continuous drag by `delta` pixels; impulse and fuel scale with distance
    pub fn drag(&mut self, delta: f32, p: &PhysicsTuning) -> bool {
        let intensity = (delta.abs() / 100.0).min(1.0);
        let velocity = (delta * p.drag_gain).clamp(-p.drag_max_impulse, p.drag_max_impulse);
        self.lateral(velocity, intensity * p.drag_fuel_cost)
    }

    /// Held direction for one step of `dt`; fuel cost is Δt-scaled
    pub fn hold(&mut self, dir: Direction, dt: f32, p: &PhysicsTuning) -> bool {
        let delta = dir.sign() * p.hold_drag_delta;
        let intensity = (delta.abs() / 100.0).min(1.0);
        let cost = intensity * p.drag_fuel_cost * (dt / NOMINAL_DT);
        let velocity = (delta * p.drag_gain).clamp(-p.drag_max_impulse, p.drag_max_impulse);
        self.lateral(velocity, cost)
    }

    fn lateral(&mut self, velocity: f32, fuel_cost: f32) -> bool {
        if self.fuel <= 0.0 {
            return false;
        }
        self.vel.x = velocity;
        self.burn(fuel_cost);
        true
    }

    /// Consume fuel, never below zero
    pub fn burn(&mut self, amount: f32) {
        self.fuel = (self.fuel - amount.max(0.0)).max(0.0);
        self.sanitize();
    }

    /// Restore fuel, never above the cap
    pub fn refuel(&mut self, amount: f32) {
        self.fuel = (self.fuel + amount.max(0.0)).min(MAX_FUEL);
        self.sanitize();
    }

    fn sanitize(&mut self) {
        if !self.fuel.is_finite() {
            self.fuel = 0.0;
        }
        self.fuel = self.fuel.clamp(0.0, MAX_FUEL);
        if !self.vel.is_finite() {
            self.vel = Vec2::ZERO;
        }
    }

    pub fn has_buff(&self, kind: BuffKind) -> bool {
        self.buffs.iter().any(|b| b.kind == kind)
    }

    /// Activate (or refresh) a timed buff. A refresh cancels the previous expiry.
    pub fn activate_buff(&mut self, kind: BuffKind, timers: &mut Timers, tuning: &BuffTuning) {
        if let Some(pos) = self.buffs.iter().position(|b| b.kind == kind) {
            let old = self.buffs.remove(pos);
            timers.cancel(old.timer);
        }
        let duration = kind.duration(tuning);
        let timer = timers.after(duration, TimerEvent::BuffExpired(kind));
        self.buffs.push(ActiveBuff {
            kind,
            expires_at: timers.now() + duration,
            timer,
        });
        self.recompute_multipliers(tuning);
    }

    /// Remove an expired buff. Returns false if it was not active.
    pub fn expire_buff(&mut self, kind: BuffKind, tuning: &BuffTuning) -> bool {
        let Some(pos) = self.buffs.iter().position(|b| b.kind == kind) else {
            return false;
        };
        self.buffs.remove(pos);
        if kind == BuffKind::Wind {
            self.wind_direction = 0.0;
        }
        self.recompute_multipliers(tuning);
        true
    }

    /// Drop all buffs (timers are cancelled by the caller's `cancel_all`)
    pub fn clear_buffs(&mut self, tuning: &BuffTuning) {
        self.buffs.clear();
        self.wind_direction = 0.0;
        self.recompute_multipliers(tuning);
    }

    /// Nominal baseline times the product of every active buff's multipliers
    fn recompute_multipliers(&mut self, tuning: &BuffTuning) {
        let (lift, buoyancy) = self.buffs.iter().fold((1.0_f32, 1.0_f32), |(l, b), buff| {
            let (bl, bb) = buff.kind.multipliers(tuning);
            (l * bl, b * bb)
        });
        self.lift_efficiency = lift.min(tuning.max_lift_efficiency);
        self.buoyancy_multiplier = buoyancy.min(tuning.max_buoyancy_multiplier);
    }

    /// Wind current: immediate lateral push, direction held until the buff expires
    pub fn apply_wind(&mut self, direction: f32, tuning: &BuffTuning, p: &PhysicsTuning) {
        self.wind_direction = direction.signum();
        self.vel.x = (self.vel.x + self.wind_direction * tuning.wind_impulse)
            .clamp(-p.max_velocity_x, p.max_velocity_x);
    }

    /// Lateral movement intensity in [0, 1] for adaptive spawning
    pub fn movement_intensity(&self, normalizer: f32) -> f32 {
        (self.vel.x.abs() / normalizer).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn balloon() -> Balloon {
        Balloon::new()
    }

    #[test]
    fn test_first_tick_from_rest_rises_gently() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        b.integrate(0.016, &p);
        assert!(b.vel.y < 0.0);
        assert!(b.vel.y > -80.0 * 0.98);
    }

    #[test]
    fn test_empty_tank_falls_to_terminal_velocity() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        b.fuel = 0.0;
        for _ in 0..2000 {
            b.integrate(1.0 / 60.0, &p);
            assert!(b.vel.y <= p.terminal_velocity);
        }
        assert!(b.vel.y > 0.0);
    }

    #[test]
    fn test_swipe_sets_impulse_and_costs_fuel() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        assert!(b.swipe(Direction::Left, &p));
        assert_eq!(b.vel.x, -120.0);
        assert!((b.fuel - 99.7).abs() < 1e-4);
    }

    #[test]
    fn test_movement_without_fuel_is_noop() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        b.fuel = 0.0;
        assert!(!b.swipe(Direction::Right, &p));
        assert!(!b.drag(90.0, &p));
        assert_eq!(b.vel.x, 0.0);
        assert_eq!(b.fuel, 0.0);
    }

    #[test]
    fn test_drag_is_clamped() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        b.drag(400.0, &p);
        assert_eq!(b.vel.x, 150.0);
        assert!((b.fuel - (100.0 - 0.15)).abs() < 1e-4);
    }

    #[test]
    fn test_buffs_stack_and_revert_to_baseline() {
        let bt = BuffTuning::default();
        let mut timers = Timers::default();
        let mut b = balloon();
        b.activate_buff(BuffKind::FuelBoost, &mut timers, &bt);
        assert_eq!(b.lift_efficiency, 2.0);
        b.activate_buff(BuffKind::Thermal, &mut timers, &bt);
        assert_eq!(b.lift_efficiency, 6.0);
        assert_eq!(b.buoyancy_multiplier, 1.5);

        assert!(b.expire_buff(BuffKind::FuelBoost, &bt));
        assert_eq!(b.lift_efficiency, 3.0);
        assert!(b.expire_buff(BuffKind::Thermal, &bt));
        assert_eq!(b.lift_efficiency, 1.0);
        assert_eq!(b.buoyancy_multiplier, 1.0);
        assert!(!b.expire_buff(BuffKind::Thermal, &bt));
    }

    #[test]
    fn test_refresh_replaces_expiry_timer() {
        let bt = BuffTuning::default();
        let mut timers = Timers::default();
        let mut b = balloon();
        b.activate_buff(BuffKind::Shield, &mut timers, &bt);
        let first = b.buffs[0].timer;
        timers.advance(2.0);
        b.activate_buff(BuffKind::Shield, &mut timers, &bt);
        assert!(!timers.is_pending(first));
        assert_eq!(b.buffs.len(), 1);
        assert!((b.buffs[0].expires_at - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_peak_tracks_highest_point() {
        let p = PhysicsTuning::default();
        let mut b = balloon();
        for _ in 0..120 {
            b.integrate(1.0 / 60.0, &p);
        }
        let peak = b.peak_y;
        assert!(peak < BALLOON_START_Y);
        b.fuel = 0.0;
        for _ in 0..600 {
            b.integrate(1.0 / 60.0, &p);
        }
        assert!(b.peak_y <= peak);
        assert!(b.max_displacement() > 0.0);
    }

    proptest! {
        #[test]
        fn prop_fuel_stays_in_range(ops in proptest::collection::vec((0u8..4, -500.0f32..500.0), 0..400)) {
            let p = PhysicsTuning::default();
            let mut b = balloon();
            for (op, amount) in ops {
                match op {
                    0 => { b.swipe(if amount < 0.0 { Direction::Left } else { Direction::Right }, &p); }
                    1 => { b.drag(amount, &p); }
                    2 => b.refuel(amount.abs()),
                    _ => b.integrate(1.0 / 60.0, &p),
                }
                prop_assert!(b.fuel >= 0.0 && b.fuel <= MAX_FUEL);
            }
        }
    }
}
