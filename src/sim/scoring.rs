//! Score, altitude, difficulty and telemetry
//!
//! Altitude only ever grows: it is derived from the balloon's highest point,
//! not its current height. Every altitude gain is worth points scaled by the
//! difficulty level.

use serde::{Deserialize, Serialize};

use super::events::{Feedback, GameEvent, RunSummary};
use super::state::GameState;
use crate::consts::ALTITUDE_UNIT;
use crate::tuning::{ScoringTuning, Tuning};

/// Per-run counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSession {
    pub score: u64,
    pub altitude: u32,
    /// Seconds of active play
    pub elapsed: f32,
    pub combo_count: u32,
    pub last_combo_at: Option<f32>,
    /// Set once when the run ends
    pub summary: Option<RunSummary>,
}

impl RunSession {
    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed.max(0.0) as u32
    }
}

/// Difficulty level and the score needed for the next one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Difficulty {
    pub level: u32,
    pub next_level_score: u64,
}

impl Difficulty {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            level: 1,
            next_level_score: tuning.scoring.first_level_up,
        }
    }
}

/// Combo multiplier for the `count`-th chained pickup
pub fn combo_multiplier(count: u32, tuning: &ScoringTuning) -> f32 {
    let chained = count.saturating_sub(1) as f32;
    (1.0 + chained * tuning.combo_step).min(tuning.combo_cap)
}

/// Record a pickup at `now` and return the multiplier it earns
pub fn register_combo(session: &mut RunSession, now: f32, tuning: &ScoringTuning) -> f32 {
    session.combo_count = match session.last_combo_at {
        Some(last) if now - last < tuning.combo_window => session.combo_count + 1,
        _ => 1,
    };
    session.last_combo_at = Some(now);
    combo_multiplier(session.combo_count, tuning)
}

/// Recompute altitude from the balloon's peak and award points for any gain
pub fn update_altitude(state: &mut GameState) {
    let altitude = (state.balloon.max_displacement() / ALTITUDE_UNIT).floor() as u32;
    if altitude <= state.session.altitude {
        return;
    }
    let gained = (altitude - state.session.altitude) as u64;
    state.session.altitude = altitude;

    let s = &state.tuning.scoring;
    let mut points = gained * s.altitude_points * state.difficulty.level as u64;
    if state.session.elapsed > s.survival_threshold {
        points += (state.session.elapsed / s.survival_divisor).floor() as u64;
    }
    state.session.score += points;
}

/// Raise the difficulty level when the score crosses the next threshold
pub fn update_difficulty(state: &mut GameState) {
    while state.session.score >= state.difficulty.next_level_score {
        state.difficulty.level += 1;
        state.difficulty.next_level_score += state.tuning.scoring.level_up_step;
        log::info!("Difficulty level {}", state.difficulty.level);
        state.emit(GameEvent::Feedback(Feedback::LevelUp(state.difficulty.level)));
    }
}

/// Last values pushed to the host
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    score: Option<u64>,
    altitude: Option<u32>,
    fuel: Option<u8>,
    time: Option<u32>,
}

impl Telemetry {
    /// Queue change events for anything that moved since the last publish
    pub fn publish(state: &mut GameState) {
        let score = state.session.score;
        let altitude = state.session.altitude;
        let fuel = state.balloon.fuel.floor() as u8;
        let time = state.session.elapsed_secs();

        let mut out = Vec::new();
        let t = &mut state.telemetry;
        if t.score != Some(score) {
            t.score = Some(score);
            out.push(GameEvent::ScoreChanged(score));
        }
        if t.altitude != Some(altitude) {
            t.altitude = Some(altitude);
            out.push(GameEvent::AltitudeChanged(altitude));
        }
        if t.fuel != Some(fuel) {
            t.fuel = Some(fuel);
            out.push(GameEvent::FuelChanged(fuel));
        }
        if t.time != Some(time) {
            t.time = Some(time);
            out.push(GameEvent::TimeChanged(time));
        }
        state.events.extend(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_combo_multiplier_steps() {
        let t = ScoringTuning::default();
        assert_eq!(combo_multiplier(1, &t), 1.0);
        assert_eq!(combo_multiplier(2, &t), 1.5);
        assert_eq!(combo_multiplier(3, &t), 2.0);
        assert_eq!(combo_multiplier(10, &t), 3.0);
    }

    #[test]
    fn test_combo_resets_after_window() {
        let t = ScoringTuning::default();
        let mut s = RunSession::default();
        assert_eq!(register_combo(&mut s, 0.0, &t), 1.0);
        assert_eq!(register_combo(&mut s, 2.0, &t), 1.5);
        assert_eq!(register_combo(&mut s, 5.5, &t), 1.0);
        assert_eq!(s.combo_count, 1);
    }

    #[test]
    fn test_altitude_gain_scores_by_level() {
        let mut state = GameState::new(1);
        state.difficulty.level = 2;
        state.balloon.peak_y = state.balloon.origin_y - 55.0;
        update_altitude(&mut state);
        assert_eq!(state.session.altitude, 5);
        assert_eq!(state.session.score, 5 * 10 * 2);

        // Falling back never lowers altitude
        state.balloon.peak_y = state.balloon.origin_y;
        update_altitude(&mut state);
        assert_eq!(state.session.altitude, 5);
    }

    #[test]
    fn test_survival_bonus_after_threshold() {
        let mut state = GameState::new(1);
        state.session.elapsed = 45.0;
        state.balloon.peak_y = state.balloon.origin_y - 10.0;
        update_altitude(&mut state);
        assert_eq!(state.session.score, 10 + 4);
    }

    #[test]
    fn test_level_thresholds() {
        let mut state = GameState::new(1);
        state.session.score = 2600;
        update_difficulty(&mut state);
        assert_eq!(state.difficulty.level, 3);
        assert_eq!(state.difficulty.next_level_score, 4000);
    }

    #[test]
    fn test_telemetry_only_publishes_changes() {
        let mut state = GameState::new(1);
        state.take_events();
        Telemetry::publish(&mut state);
        assert_eq!(state.take_events().len(), 4);
        Telemetry::publish(&mut state);
        assert!(state.take_events().is_empty());
        state.session.score = 10;
        Telemetry::publish(&mut state);
        assert_eq!(state.take_events(), vec![GameEvent::ScoreChanged(10)]);
    }

    proptest! {
        #[test]
        fn prop_altitude_is_monotone(peaks in proptest::collection::vec(0.0f32..5000.0, 1..100)) {
            let mut state = GameState::new(1);
            let mut last = 0;
            for rise in peaks {
                state.balloon.peak_y = state.balloon.peak_y.min(state.balloon.origin_y - rise);
                update_altitude(&mut state);
                prop_assert!(state.session.altitude >= last);
                last = state.session.altitude;
            }
        }
    }
}
