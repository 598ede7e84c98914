//! Browser bindings
//!
//! `WebGame` is the JavaScript face of `Game`. The page registers plain JS
//! callbacks, drives `frame` from requestAnimationFrame and renders from
//! `snapshot_json`.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::cache::CachedLeaderboard;
use crate::game::{Game, GameObserver, HostState};
use crate::highscores::{HighScores, Leaderboard};
use crate::settings::Settings;
use crate::sim::{Direction, Feedback, RunSummary};

/// Install panic hook and logger once per page
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Sky Ascent (web) starting...");
}

/// Forwards game callbacks to JS functions registered by the page
#[derive(Default)]
pub struct JsObserver {
    score: Option<js_sys::Function>,
    altitude: Option<js_sys::Function>,
    fuel: Option<js_sys::Function>,
    time: Option<js_sys::Function>,
    state: Option<js_sys::Function>,
    end: Option<js_sys::Function>,
    feedback: Option<js_sys::Function>,
}

fn call(callback: &Option<js_sys::Function>, arg: JsValue) {
    if let Some(f) = callback {
        if let Err(e) = f.call1(&JsValue::NULL, &arg) {
            log::warn!("Host callback threw: {e:?}");
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json) => JsValue::from_str(&json),
        Err(e) => {
            log::warn!("Serialization failed: {e}");
            JsValue::NULL
        }
    }
}

impl GameObserver for JsObserver {
    fn on_score_update(&mut self, score: u64) {
        call(&self.score, JsValue::from_f64(score as f64));
    }

    fn on_altitude_update(&mut self, altitude: u32) {
        call(&self.altitude, JsValue::from(altitude));
    }

    fn on_fuel_update(&mut self, fuel: u8) {
        call(&self.fuel, JsValue::from(fuel));
    }

    fn on_time_update(&mut self, seconds: u32) {
        call(&self.time, JsValue::from(seconds));
    }

    fn on_game_state_change(&mut self, state: HostState) {
        call(&self.state, JsValue::from_str(state.as_str()));
    }

    fn on_game_end(&mut self, summary: &RunSummary) {
        call(&self.end, to_json(summary));
    }

    fn on_feedback(&mut self, feedback: &Feedback) {
        call(&self.feedback, to_json(feedback));
    }
}

#[wasm_bindgen]
pub struct WebGame {
    game: Rc<RefCell<Game<JsObserver>>>,
}

#[wasm_bindgen]
impl WebGame {
    /// New session. A seed of 0 picks one from the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebGame {
        let seed = if seed == 0 {
            js_sys::Date::now() as u64
        } else {
            seed
        };
        log::info!("New game with seed: {seed}");

        let mut game = Game::new(seed, JsObserver::default());
        game.set_settings(Settings::load());
        let board: Box<dyn Leaderboard> = Box::new(CachedLeaderboard::new(HighScores::load()));
        game.set_leaderboard(board);

        let game = Rc::new(RefCell::new(game));
        attach_visibility_listener(&game);
        WebGame { game }
    }

    pub fn on_score(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().score = Some(f);
    }

    pub fn on_altitude(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().altitude = Some(f);
    }

    pub fn on_fuel(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().fuel = Some(f);
    }

    pub fn on_time(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().time = Some(f);
    }

    pub fn on_state(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().state = Some(f);
    }

    pub fn on_end(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().end = Some(f);
    }

    pub fn on_feedback(&self, f: js_sys::Function) {
        self.game.borrow_mut().observer_mut().feedback = Some(f);
    }

    pub fn set_player(&self, player: Option<String>) {
        self.game.borrow_mut().set_player(player);
    }

    pub fn start(&self) -> bool {
        self.game.borrow_mut().start()
    }

    pub fn pause(&self) -> bool {
        self.game.borrow_mut().pause()
    }

    pub fn resume(&self) -> bool {
        self.game.borrow_mut().resume()
    }

    pub fn move_left(&self) {
        self.game.borrow_mut().move_left();
    }

    pub fn move_right(&self) {
        self.game.borrow_mut().move_right();
    }

    pub fn drag(&self, dx: f32) {
        self.game.borrow_mut().drag(dx);
    }

    pub fn end_drag(&self) {
        self.game.borrow_mut().end_drag();
    }

    /// -1 holds left, 1 holds right, 0 releases
    pub fn hold(&self, dir: i32) {
        let dir = match dir.signum() {
            -1 => Some(Direction::Left),
            1 => Some(Direction::Right),
            _ => None,
        };
        self.game.borrow_mut().set_held(dir);
    }

    pub fn set_visible(&self, visible: bool) {
        self.game.borrow_mut().set_visible(visible);
    }

    /// Advance by `dt_ms` milliseconds of wall time
    pub fn frame(&self, dt_ms: f64) {
        self.game.borrow_mut().frame((dt_ms / 1000.0) as f32);
    }

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.game.borrow().snapshot()).unwrap_or_default()
    }

    pub fn settings_json(&self) -> String {
        serde_json::to_string(self.game.borrow().settings()).unwrap_or_default()
    }

    /// Replace settings from JSON and persist them
    pub fn set_settings_json(&self, json: &str) -> bool {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => {
                settings.save();
                self.game.borrow_mut().set_settings(settings);
                true
            }
            Err(e) => {
                log::warn!("Ignoring settings: {e}");
                false
            }
        }
    }

    pub fn restart(&self, seed: u64) {
        self.game.borrow_mut().restart(seed);
    }

    pub fn destroy(&self) {
        self.game.borrow_mut().destroy();
    }
}

/// Pause while the tab is hidden, resume when it comes back
fn attach_visibility_listener(game: &Rc<RefCell<Game<JsObserver>>>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::warn!("No document; visibility auto-pause disabled");
        return;
    };

    let weak = Rc::downgrade(game);
    let doc = document.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let Some(game) = weak.upgrade() else {
            return;
        };
        let visible = doc.visibility_state() != web_sys::VisibilityState::Hidden;
        // Skip if the page is mid-call into the game
        if let Ok(mut g) = game.try_borrow_mut() {
            g.set_visible(visible);
        }
    });
    let _ = document
        .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
    closure.forget();
}
