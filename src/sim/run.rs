//! Run lifecycle
//!
//! `Loading -> Countdown -> Active -> Ended`, with `Paused` reachable from
//! both live phases. Every phase change goes through `transition`, which
//! rejects edges the lifecycle does not allow. That is what keeps the
//! countdown from completing twice and the end report from firing twice.

use serde::{Deserialize, Serialize};

use super::events::{EndReason, Feedback, GameEvent, HostState, RunSummary};
use super::scoring::Telemetry;
use super::state::GameState;
use super::timers::TimerEvent;

/// Run phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Created, waiting for `start`
    Loading,
    /// 3, 2, 1 before play
    Countdown,
    /// Physics, spawning and scoring are live
    Active,
    Paused,
    /// Terminal
    Ended,
}

impl RunPhase {
    /// What the host is told
    pub fn host_state(&self) -> HostState {
        match self {
            RunPhase::Loading => HostState::Loading,
            RunPhase::Countdown | RunPhase::Active => HostState::Playing,
            RunPhase::Paused => HostState::Paused,
            RunPhase::Ended => HostState::Ended,
        }
    }

    /// Whether the simulation clock runs in this phase
    pub fn is_live(&self) -> bool {
        matches!(self, RunPhase::Countdown | RunPhase::Active)
    }
}

/// Move to `to` if the lifecycle allows it
pub fn transition(state: &mut GameState, to: RunPhase) -> bool {
    let from = state.phase;
    let allowed = match (from, to) {
        (RunPhase::Loading, RunPhase::Countdown) => true,
        (RunPhase::Countdown, RunPhase::Active) => true,
        (RunPhase::Countdown | RunPhase::Active, RunPhase::Paused) => true,
        (RunPhase::Paused, target) => state.resume_to == Some(target) || target == RunPhase::Ended,
        (RunPhase::Ended, _) => false,
        (_, RunPhase::Ended) => true,
        _ => false,
    };
    if !allowed {
        log::debug!("Ignored transition {from:?} -> {to:?}");
        return false;
    }

    state.phase = to;
    log::info!("Run phase {from:?} -> {to:?}");
    state.announce_state();
    true
}

/// Begin the countdown
pub fn start(state: &mut GameState) -> bool {
    if !transition(state, RunPhase::Countdown) {
        return false;
    }
    state.countdown = state.tuning.countdown_from;
    if state.countdown == 0 {
        return finish_countdown(state);
    }
    state.emit(GameEvent::Feedback(Feedback::CountdownPulse(state.countdown)));
    state.countdown_timer = Some(state.timers.every(1.0, TimerEvent::CountdownStep));
    true
}

/// One countdown second elapsed
pub fn countdown_step(state: &mut GameState) {
    if state.phase != RunPhase::Countdown {
        return;
    }
    state.countdown = state.countdown.saturating_sub(1);
    if state.countdown > 0 {
        state.emit(GameEvent::Feedback(Feedback::CountdownPulse(state.countdown)));
    } else {
        finish_countdown(state);
    }
}

/// Countdown reached zero: go live. Only the first call succeeds.
pub fn finish_countdown(state: &mut GameState) -> bool {
    if let Some(id) = state.countdown_timer.take() {
        state.timers.cancel(id);
    }
    if !transition(state, RunPhase::Active) {
        return false;
    }
    state.countdown = 0;
    state.emit(GameEvent::Feedback(Feedback::Go));

    // Initial lift so the first frames do not sit still
    state.balloon.vel.y =
        -state.tuning.physics.base_buoyancy * state.balloon.buoyancy_multiplier;
    let now = state.now();
    state.spawner.reset_clocks(now);
    true
}

pub fn pause(state: &mut GameState) -> bool {
    let from = state.phase;
    if !from.is_live() {
        return false;
    }
    state.resume_to = Some(from);
    transition(state, RunPhase::Paused)
}

pub fn resume(state: &mut GameState) -> bool {
    let Some(to) = state.resume_to else {
        return false;
    };
    if state.phase != RunPhase::Paused || !transition(state, to) {
        return false;
    }
    state.resume_to = None;
    true
}

/// End the run and record the summary. Later calls are no-ops.
pub fn end_run(state: &mut GameState, reason: EndReason) -> bool {
    if state.phase == RunPhase::Ended {
        return false;
    }
    let cancelled = state.timers.cancel_all();
    state.countdown_timer = None;
    let buffs = state.tuning.buffs.clone();
    state.balloon.clear_buffs(&buffs);
    state.balloon.vel = glam::Vec2::ZERO;
    state.spawner.clear_zones();

    let summary = RunSummary {
        score: state.session.score,
        altitude: state.session.altitude,
        elapsed_secs: state.session.elapsed_secs(),
        reason: reason.to_string(),
    };
    log::info!(
        "Run ended: {} (score {}, altitude {}, {}s, {cancelled} timers cancelled)",
        summary.reason,
        summary.score,
        summary.altitude,
        summary.elapsed_secs
    );
    state.session.summary = Some(summary.clone());

    // Flush final values, then the end report, then the state change
    Telemetry::publish(state);
    state.emit(GameEvent::GameEnded(summary));
    state.phase = RunPhase::Ended;
    state.resume_to = None;
    state.announce_state();
    true
}

/// Release everything the session holds. Safe to call repeatedly.
pub fn teardown(state: &mut GameState) {
    state.timers.cancel_all();
    state.countdown_timer = None;
    state.spawner.clear_zones();
    let released = state.pool.release_all();
    if released > 0 {
        log::debug!("Teardown released {released} entities");
    }
}

/// Test helper: start and skip the countdown
#[cfg(test)]
pub(crate) fn start_active(state: &mut GameState) {
    start(state);
    finish_countdown(state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_reaches_active_once() {
        let mut state = GameState::new(1);
        assert!(start(&mut state));
        assert!(!start(&mut state));
        for _ in 0..3 {
            let fired = state.timers.advance(1.0);
            for _ in fired {
                countdown_step(&mut state);
            }
        }
        assert_eq!(state.phase, RunPhase::Active);
        assert!(!finish_countdown(&mut state));
        let gos = state
            .take_events()
            .into_iter()
            .filter(|e| *e == GameEvent::Feedback(Feedback::Go))
            .count();
        assert_eq!(gos, 1);
        assert_eq!(state.timers.pending_count(), 0);
    }

    #[test]
    fn test_countdown_pulses() {
        let mut state = GameState::new(1);
        state.take_events();
        start(&mut state);
        state.timers.advance(1.0);
        countdown_step(&mut state);
        let pulses: Vec<u8> = state
            .take_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Feedback(Feedback::CountdownPulse(n)) => Some(n),
                _ => None,
            })
            .collect();
        assert_eq!(pulses, vec![3, 2]);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let mut state = GameState::new(1);
        start(&mut state);
        assert!(pause(&mut state));
        assert_eq!(state.phase, RunPhase::Paused);
        assert!(!pause(&mut state));
        assert!(resume(&mut state));
        assert_eq!(state.phase, RunPhase::Countdown);
        finish_countdown(&mut state);
        assert!(pause(&mut state));
        assert!(resume(&mut state));
        assert_eq!(state.phase, RunPhase::Active);
        assert!(!resume(&mut state));
    }

    #[test]
    fn test_end_run_is_idempotent() {
        let mut state = GameState::new(1);
        start_active(&mut state);
        state.take_events();
        assert!(end_run(&mut state, EndReason::OutOfFuel));
        assert!(!end_run(&mut state, EndReason::OutOfFuel));
        let events = state.take_events();
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameEnded(_)))
            .collect();
        assert_eq!(ended.len(), 1);
        assert_eq!(
            events.last(),
            Some(&GameEvent::StateChanged(HostState::Ended))
        );
        assert_eq!(state.timers.pending_count(), 0);
        assert!(!transition(&mut state, RunPhase::Active));
    }

    #[test]
    fn test_go_gives_initial_lift() {
        let mut state = GameState::new(1);
        start_active(&mut state);
        assert_eq!(state.balloon.vel.y, -80.0);
    }
}
