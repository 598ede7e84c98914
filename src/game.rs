//! Host-facing game controller
//!
//! Wraps one `GameState` and is the only thing a host talks to. Controls go
//! in as method calls; everything the simulation reports comes back out
//! through the `GameObserver` callbacks, dispatched after each call.

use crate::consts::MAX_FRAME_DT;
use crate::highscores::{Leaderboard, ScoreSubmission};
use crate::settings::Settings;
use crate::sim::{
    Direction, Feedback, FrameSnapshot, GameEvent, GameState, RunPhase, RunSummary, TickInput,
    run, tick,
};
use crate::tuning::Tuning;

pub use crate::sim::HostState;

/// Outbound callbacks. Every method has a no-op default.
pub trait GameObserver {
    fn on_score_update(&mut self, _score: u64) {}
    fn on_altitude_update(&mut self, _altitude: u32) {}
    fn on_fuel_update(&mut self, _fuel: u8) {}
    fn on_time_update(&mut self, _seconds: u32) {}
    fn on_game_state_change(&mut self, _state: HostState) {}
    /// Called exactly once per run, before the `Ended` state change
    fn on_game_end(&mut self, _summary: &RunSummary) {}
    fn on_feedback(&mut self, _feedback: &Feedback) {}
}

impl GameObserver for () {}

/// One play session plus its host plumbing
pub struct Game<O: GameObserver = ()> {
    state: GameState,
    observer: O,
    input: TickInput,
    settings: Settings,
    leaderboard: Option<Box<dyn Leaderboard>>,
    player: Option<String>,
    /// Accumulated pointer travel below the drag threshold
    drag_accum: f32,
    /// Paused because the page was hidden, not by the player
    auto_paused: bool,
    destroyed: bool,
    last_rank: Option<usize>,
}

impl<O: GameObserver> Game<O> {
    pub fn new(seed: u64, observer: O) -> Self {
        Self::from_state(GameState::new(seed), observer)
    }

    pub fn with_tuning(seed: u64, tuning: Tuning, observer: O) -> Self {
        Self::from_state(GameState::with_tuning(seed, tuning), observer)
    }

    pub fn from_state(state: GameState, observer: O) -> Self {
        let mut game = Self {
            state,
            observer,
            input: TickInput::default(),
            settings: Settings::default(),
            leaderboard: None,
            player: None,
            drag_accum: 0.0,
            auto_paused: false,
            destroyed: false,
            last_rank: None,
        };
        game.flush();
        game
    }

    /// Attach the score service finished runs are submitted to
    pub fn set_leaderboard(&mut self, leaderboard: Box<dyn Leaderboard>) {
        self.leaderboard = Some(leaderboard);
    }

    /// Identity attached to submissions (None plays anonymously)
    pub fn set_player(&mut self, player: Option<String>) {
        self.player = player;
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Rank the last finished run achieved on the leaderboard, if any
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Begin the countdown
    pub fn start(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let started = run::start(&mut self.state);
        self.flush();
        started
    }

    pub fn pause(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let paused = run::pause(&mut self.state);
        if paused {
            self.auto_paused = false;
            self.clear_input();
        }
        self.flush();
        paused
    }

    pub fn resume(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        let resumed = run::resume(&mut self.state);
        if resumed {
            self.auto_paused = false;
        }
        self.flush();
        resumed
    }

    /// Page visibility changed. Hiding pauses (countdown included); showing
    /// again only resumes a pause the visibility change caused.
    pub fn set_visible(&mut self, visible: bool) {
        if self.destroyed {
            return;
        }
        if !visible {
            if self.settings.pause_on_hide && run::pause(&mut self.state) {
                log::info!("Auto-paused (page hidden)");
                self.auto_paused = true;
                self.clear_input();
            }
        } else if self.auto_paused {
            self.auto_paused = false;
            if run::resume(&mut self.state) {
                log::info!("Resumed (page visible)");
            }
        }
        self.flush();
    }

    pub fn move_left(&mut self) {
        self.push_swipe(Direction::Left);
    }

    pub fn move_right(&mut self) {
        self.push_swipe(Direction::Right);
    }

    fn push_swipe(&mut self, dir: Direction) {
        if self.accepts_input() {
            self.input.swipes.push(dir);
        }
    }

    /// Pointer moved by `dx` pixels while dragging. Small movements
    /// accumulate until they exceed the drag threshold.
    pub fn drag(&mut self, dx: f32) {
        if !self.accepts_input() || !dx.is_finite() {
            return;
        }
        self.drag_accum += dx;
        if self.drag_accum.abs() > self.state.tuning.physics.drag_threshold {
            self.input.drags.push(self.drag_accum);
            self.drag_accum = 0.0;
        }
    }

    /// Pointer released
    pub fn end_drag(&mut self) {
        self.drag_accum = 0.0;
    }

    /// Held direction buttons/keys (None when released)
    pub fn set_held(&mut self, dir: Option<Direction>) {
        self.input.held = if self.accepts_input() { dir } else { None };
    }

    fn accepts_input(&self) -> bool {
        !self.destroyed && self.state.phase == RunPhase::Active
    }

    fn clear_input(&mut self) {
        self.input.swipes.clear();
        self.input.drags.clear();
        self.input.held = None;
        self.drag_accum = 0.0;
    }

    /// Advance one rendered frame of `dt` seconds
    pub fn frame(&mut self, dt: f32) {
        if self.destroyed {
            return;
        }
        let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.input.autopilot = self.settings.autopilot;
        tick(&mut self.state, &self.input, dt);

        // One-shot intents are consumed by the tick
        self.input.swipes.clear();
        self.input.drags.clear();
        if self.state.phase != RunPhase::Active {
            self.input.held = None;
        }
        self.flush();
    }

    /// Renderer view of the current frame
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(&self.state)
    }

    /// Throw away the current session and load a fresh one
    pub fn restart(&mut self, seed: u64) {
        if self.destroyed {
            return;
        }
        run::teardown(&mut self.state);
        let tuning = self.state.tuning.clone();
        let assets = self.state.assets.clone();
        self.state = GameState::with_assets(seed, tuning, assets);
        self.clear_input();
        self.auto_paused = false;
        self.last_rank = None;
        self.flush();
    }

    /// Tear the session down. Further calls, controls and frames are no-ops.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        run::teardown(&mut self.state);
        self.clear_input();
        self.destroyed = true;
        // Drop anything queued; the host is gone
        self.state.take_events();
        log::info!("Game destroyed");
    }

    /// Dispatch queued simulation events to the observer
    fn flush(&mut self) {
        for event in self.state.take_events() {
            match event {
                GameEvent::ScoreChanged(score) => self.observer.on_score_update(score),
                GameEvent::AltitudeChanged(altitude) => self.observer.on_altitude_update(altitude),
                GameEvent::FuelChanged(fuel) => self.observer.on_fuel_update(fuel),
                GameEvent::TimeChanged(seconds) => self.observer.on_time_update(seconds),
                GameEvent::StateChanged(state) => self.observer.on_game_state_change(state),
                GameEvent::GameEnded(summary) => {
                    self.observer.on_game_end(&summary);
                    self.submit(&summary);
                }
                GameEvent::Feedback(feedback) => {
                    if self.settings.allows(&feedback) {
                        self.observer.on_feedback(&feedback);
                    }
                }
            }
        }
    }

    /// Hand a finished run to the leaderboard. Failures are logged only.
    fn submit(&mut self, summary: &RunSummary) {
        let Some(board) = self.leaderboard.as_mut() else {
            return;
        };
        let run = ScoreSubmission::from_summary(summary, self.player.clone());
        match board.submit(&run) {
            Ok(rank) => {
                if let Some(rank) = rank {
                    log::info!("New high score, rank {rank}");
                }
                self.last_rank = rank;
            }
            Err(e) => log::warn!("Score submission failed: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::{HighScoreEntry, HighScores, LeaderboardError};

    /// Records every callback in order
    #[derive(Default)]
    struct Recorder {
        states: Vec<HostState>,
        ends: Vec<RunSummary>,
        shakes: usize,
        order: Vec<&'static str>,
    }

    impl GameObserver for Recorder {
        fn on_game_state_change(&mut self, state: HostState) {
            self.states.push(state);
            self.order.push("state");
        }
        fn on_game_end(&mut self, summary: &RunSummary) {
            self.ends.push(summary.clone());
            self.order.push("end");
        }
        fn on_feedback(&mut self, feedback: &Feedback) {
            if matches!(feedback, Feedback::CameraShake(_)) {
                self.shakes += 1;
            }
        }
    }

    struct OfflineBoard;

    impl Leaderboard for OfflineBoard {
        fn submit(&mut self, _run: &ScoreSubmission) -> Result<Option<usize>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }
        fn top(&mut self, _limit: usize) -> Result<Vec<HighScoreEntry>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".into()))
        }
    }

    const DT: f32 = 1.0 / 60.0;

    fn playing(seed: u64) -> Game<Recorder> {
        let mut game = Game::new(seed, Recorder::default());
        game.start();
        for _ in 0..200 {
            game.frame(DT);
        }
        assert_eq!(game.state().phase, RunPhase::Active);
        game
    }

    #[test]
    fn test_lifecycle_states() {
        let mut game = Game::new(1, Recorder::default());
        assert_eq!(game.observer().states, vec![HostState::Loading]);
        game.start();
        game.pause();
        game.resume();
        assert_eq!(
            game.observer().states,
            vec![
                HostState::Loading,
                HostState::Playing,
                HostState::Paused,
                HostState::Playing
            ]
        );
    }

    #[test]
    fn test_game_end_reported_once_before_state_change() {
        let mut game = playing(2);
        game.state.balloon.fuel = 0.1;
        game.move_left();
        game.frame(DT);
        game.frame(DT);
        game.move_right();
        game.frame(DT);

        let obs = game.observer();
        assert_eq!(obs.ends.len(), 1);
        assert_eq!(obs.ends[0].reason, "Out of fuel!");
        assert_eq!(obs.order[obs.order.len() - 2..], ["end", "state"]);
        assert_eq!(obs.states.last(), Some(&HostState::Ended));
    }

    #[test]
    fn test_hidden_page_pauses_countdown_and_resumes() {
        let mut game = Game::new(3, Recorder::default());
        game.start();
        game.set_visible(false);
        assert_eq!(game.state().phase, RunPhase::Paused);
        let now = game.state().now();
        game.frame(DT);
        assert_eq!(game.state().now(), now);
        game.set_visible(true);
        assert_eq!(game.state().phase, RunPhase::Countdown);
    }

    #[test]
    fn test_manual_pause_survives_visibility() {
        let mut game = playing(4);
        game.pause();
        game.set_visible(false);
        game.set_visible(true);
        assert_eq!(game.state().phase, RunPhase::Paused);
    }

    #[test]
    fn test_small_drags_accumulate() {
        let mut game = playing(5);
        game.drag(10.0);
        game.drag(10.0);
        assert!(game.input.drags.is_empty());
        game.drag(15.0);
        assert_eq!(game.input.drags, vec![35.0]);
        game.frame(DT);
        assert!(game.input.drags.is_empty());
        assert!(game.state().balloon.vel.x > 0.0);
    }

    #[test]
    fn test_controls_ignored_when_not_active() {
        let mut game = Game::new(6, Recorder::default());
        game.move_left();
        game.drag(100.0);
        assert!(game.input.swipes.is_empty());
        assert!(game.input.drags.is_empty());
    }

    #[test]
    fn test_failed_submission_does_not_block() {
        let mut game = playing(7);
        game.set_leaderboard(Box::new(OfflineBoard));
        game.state.balloon.fuel = 0.1;
        game.move_left();
        game.frame(DT);
        assert_eq!(game.observer().ends.len(), 1);
        assert_eq!(game.last_rank(), None);
        game.restart(8);
        assert_eq!(game.state().phase, RunPhase::Loading);
        assert!(game.start());
    }

    #[test]
    fn test_local_board_records_run() {
        let mut game = playing(9);
        game.set_leaderboard(Box::new(HighScores::new()));
        game.state.session.score = 500;
        game.state.balloon.fuel = 0.1;
        game.move_left();
        game.frame(DT);
        assert_eq!(game.last_rank(), Some(1));
    }

    #[test]
    fn test_reduced_motion_filters_shake() {
        let mut game = playing(10);
        game.set_settings(Settings {
            reduced_motion: true,
            ..Default::default()
        });
        game.state.emit(GameEvent::Feedback(Feedback::CameraShake(1.0)));
        game.frame(DT);
        assert_eq!(game.observer().shakes, 0);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let mut game = playing(11);
        game.destroy();
        game.destroy();
        assert!(game.is_destroyed());
        assert_eq!(game.state().pool.active_count(), 0);
        assert_eq!(game.state().timers.pending_count(), 0);
        assert!(!game.start());
        game.frame(DT);
        assert!(game.observer().ends.is_empty());
    }
}
