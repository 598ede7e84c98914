//! Per-frame simulation tick
//!
//! Core game loop that advances the session by one Δt-sized step.

use super::collision::resolve_collisions;
use super::events::{EndReason, Feedback, GameEvent};
use super::physics::{BuffKind, Direction};
use super::run::{self, RunPhase};
use super::scoring::{self, Telemetry};
use super::spawn;
use super::state::{EntityKind, GameState};
use super::timers::TimerEvent;
use crate::consts::MAX_FRAME_DT;

/// Control intents gathered since the previous tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Discrete left/right presses (swipes, keys, buttons)
    pub swipes: Vec<Direction>,
    /// Pointer drag deltas in pixels, already past the drag threshold
    pub drags: Vec<f32>,
    /// Direction currently held down, if any
    pub held: Option<Direction>,
    /// Demo mode - steer automatically
    pub autopilot: bool,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        self.swipes.is_empty() && self.drags.is_empty() && self.held.is_none()
    }
}

/// Advance the session by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Paused, loading and ended sessions do not advance, timers included
    if !state.phase.is_live() {
        return;
    }
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    for (_, event) in state.timers.advance(dt) {
        dispatch_timer(state, event);
    }

    if state.phase == RunPhase::Active {
        step_active(state, input, dt);
    }

    if state.phase.is_live() {
        Telemetry::publish(state);
    }
}

fn dispatch_timer(state: &mut GameState, event: TimerEvent) {
    match event {
        TimerEvent::CountdownStep => run::countdown_step(state),
        TimerEvent::BuffExpired(kind) => {
            let buffs = state.tuning.buffs.clone();
            if state.balloon.expire_buff(kind, &buffs) {
                log::debug!("Buff {kind:?} expired");
                state.emit(GameEvent::Feedback(Feedback::BuffEnded(kind)));
            }
        }
        TimerEvent::ZoneExpired { zone } => spawn::on_zone_expired(state, zone),
        TimerEvent::DangerReward { zone } => spawn::on_danger_reward(state, zone),
    }
}

fn step_active(state: &mut GameState, input: &TickInput, dt: f32) {
    state.session.elapsed += dt;

    let autopilot;
    let input = if input.autopilot && input.is_empty() {
        autopilot = autopilot_input(state);
        &autopilot
    } else {
        input
    };
    apply_input(state, input, dt);

    let s = &state.tuning.spawn;
    let intensity = state.balloon.movement_intensity(s.movement_normalizer);
    let history = s.movement_history;
    state.spawner.record_movement(intensity, history);

    let physics = state.tuning.physics.clone();
    state.balloon.integrate(dt, &physics);
    spawn::update_entities(state, dt);

    if resolve_collisions(state) {
        return;
    }

    scoring::update_altitude(state);
    scoring::update_difficulty(state);

    if state.balloon.fuel <= 0.0 {
        run::end_run(state, EndReason::OutOfFuel);
        return;
    }

    spawn::run_spawner(state, dt);
    spawn::cleanup(state);
}

fn apply_input(state: &mut GameState, input: &TickInput, dt: f32) {
    let p = &state.tuning.physics;
    let mut moved = false;
    for dir in &input.swipes {
        moved |= state.balloon.swipe(*dir, p);
    }
    for delta in &input.drags {
        moved |= state.balloon.drag(*delta, p);
    }
    if let Some(dir) = input.held {
        moved |= state.balloon.hold(dir, dt, p);
    }
    if moved && !input.swipes.is_empty() {
        state.emit(GameEvent::Feedback(Feedback::Haptic(10)));
    }
}

/// Dodge the nearest threatening obstacle, otherwise drift toward the
/// nearest power-up ahead.
fn autopilot_input(state: &GameState) -> TickInput {
    let balloon = state.balloon.pos;
    let mut input = TickInput::default();
    // Keep a reserve; steering costs fuel
    if state.balloon.fuel < 10.0 && !state.balloon.has_buff(BuffKind::Shield) {
        return input;
    }

    let threat = state
        .pool
        .iter_active()
        .filter(|(_, e)| matches!(e.kind, EntityKind::Obstacle(_)))
        .filter(|(_, e)| {
            let dy = balloon.y - e.pos.y;
            dy > -40.0 && dy < 260.0 && (e.pos.x - balloon.x).abs() < 90.0
        })
        .min_by(|(_, a), (_, b)| {
            (balloon.y - a.pos.y)
                .partial_cmp(&(balloon.y - b.pos.y))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    if let Some((_, obstacle)) = threat {
        if state.shield_active() {
            return input;
        }
        // Break toward the side with more room
        let away = if obstacle.pos.x >= balloon.x {
            Direction::Left
        } else {
            Direction::Right
        };
        let away = if (away == Direction::Left && balloon.x < 120.0)
            || (away == Direction::Right && balloon.x > crate::consts::WORLD_WIDTH - 120.0)
        {
            if away == Direction::Left {
                Direction::Right
            } else {
                Direction::Left
            }
        } else {
            away
        };
        input.held = Some(away);
        return input;
    }

    let target = state
        .pool
        .iter_active()
        .filter(|(_, e)| matches!(e.kind, EntityKind::PowerUp(_)))
        .filter(|(_, e)| e.pos.y < balloon.y)
        .min_by(|(_, a), (_, b)| {
            a.pos
                .distance_squared(balloon)
                .partial_cmp(&b.pos.distance_squared(balloon))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    if let Some((_, powerup)) = target {
        let dx = powerup.pos.x - balloon.x;
        if dx.abs() > 30.0 && state.balloon.vel.x.abs() < 40.0 {
            input.held = Some(if dx < 0.0 {
                Direction::Left
            } else {
                Direction::Right
            });
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::NOMINAL_DT;
    use crate::sim::events::HostState;
    use crate::sim::state::PoolClass;

    const DT: f32 = 1.0 / 60.0;

    fn active_state(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        run::start_active(&mut state);
        state.take_events();
        state
    }

    /// Active session with every spawn source switched off
    fn quiet_state(seed: u64) -> GameState {
        let mut tuning = crate::tuning::Tuning::default();
        tuning.spawn.obstacle_base_interval = 1.0e6;
        tuning.spawn.powerup_base_interval = 1.0e6;
        tuning.spawn.wave_chance = 0.0;
        tuning.spawn.zone_chance = 0.0;
        let mut state = GameState::with_tuning(seed, tuning);
        run::start_active(&mut state);
        state.take_events();
        state
    }

    #[test]
    fn test_tick_countdown_to_active() {
        let mut state = GameState::new(12345);
        let input = TickInput::default();

        // Loading does not tick
        tick(&mut state, &input, DT);
        assert_eq!(state.now(), 0.0);

        run::start(&mut state);
        for _ in 0..40 {
            tick(&mut state, &input, 0.1);
        }
        assert_eq!(state.phase, RunPhase::Active);
        let gos = state
            .take_events()
            .iter()
            .filter(|e| **e == GameEvent::Feedback(Feedback::Go))
            .count();
        assert_eq!(gos, 1);
    }

    #[test]
    fn test_tick_pause_freezes_everything() {
        let mut state = active_state(12345);
        let input = TickInput::default();
        tick(&mut state, &input, DT);
        let (now, pos) = (state.now(), state.balloon.pos);

        run::pause(&mut state);
        for _ in 0..60 {
            tick(&mut state, &input, DT);
        }
        assert_eq!(state.now(), now);
        assert_eq!(state.balloon.pos, pos);

        run::resume(&mut state);
        tick(&mut state, &input, DT);
        assert!(state.now() > now);
    }

    #[test]
    fn test_frame_gap_is_clamped() {
        let mut state = active_state(1);
        tick(&mut state, &TickInput::default(), 5.0);
        assert!((state.now() - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_fuel_depletion_ends_once() {
        let mut state = active_state(3);
        state.balloon.fuel = 0.2;
        let input = TickInput {
            swipes: vec![Direction::Left],
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, RunPhase::Ended);
        tick(&mut state, &input, DT);

        let events = state.take_events();
        let summaries: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::GameEnded(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].reason, "Out of fuel!");
        assert!(events.contains(&GameEvent::StateChanged(HostState::Ended)));
    }

    #[test]
    fn test_buff_expires_back_to_baseline() {
        let mut state = quiet_state(4);
        let bt = state.tuning.buffs.clone();
        state
            .balloon
            .activate_buff(BuffKind::Turbo, &mut state.timers, &bt);
        assert_eq!(state.balloon.lift_efficiency, 4.0);
        for _ in 0..(3.5 / DT) as usize {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, RunPhase::Active);
        assert_eq!(state.pool.active_count(), 0);
        assert!(!state.balloon.has_buff(BuffKind::Turbo));
        assert_eq!(state.balloon.lift_efficiency, 1.0);
        assert_eq!(state.balloon.buoyancy_multiplier, 1.0);
    }

    #[test]
    fn test_telemetry_reports_changes() {
        let mut state = active_state(5);
        tick(&mut state, &TickInput::default(), DT);
        let events = state.take_events();
        assert!(events.contains(&GameEvent::FuelChanged(100)));
        assert!(events.contains(&GameEvent::TimeChanged(0)));
    }

    #[test]
    fn test_held_direction_costs_fuel_per_dt() {
        let mut state = active_state(6);
        let input = TickInput {
            held: Some(Direction::Right),
            ..Default::default()
        };
        tick(&mut state, &input, NOMINAL_DT);
        let spent_one = 100.0 - state.balloon.fuel;
        let mut state2 = active_state(6);
        tick(&mut state2, &input, NOMINAL_DT * 2.0);
        let spent_two = 100.0 - state2.balloon.fuel;
        assert!((spent_two - spent_one * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_autopilot_survives_a_while() {
        let mut state = active_state(42);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut state, &input, DT);
        }
        assert!(state.session.altitude > 0);
        assert!(state.pool.active_handles(PoolClass::Obstacle).len() <= state.tuning.max_active_entities);
    }

    #[test]
    fn test_determinism() {
        let mut a = active_state(99999);
        let mut b = active_state(99999);
        let inputs = [
            TickInput {
                swipes: vec![Direction::Left],
                ..Default::default()
            },
            TickInput {
                drags: vec![45.0],
                ..Default::default()
            },
            TickInput::default(),
            TickInput {
                autopilot: true,
                ..Default::default()
            },
        ];
        for _ in 0..300 {
            for input in &inputs {
                tick(&mut a, input, DT);
                tick(&mut b, input, DT);
            }
        }
        assert_eq!(a.session.score, b.session.score);
        assert_eq!(a.session.altitude, b.session.altitude);
        assert_eq!(a.balloon.pos, b.balloon.pos);
        assert_eq!(a.pool.active_count(), b.pool.active_count());
        assert_eq!(a.phase, b.phase);
    }
}
