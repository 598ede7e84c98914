//! Sky Ascent entry point
//!
//! The web build is driven from JavaScript through `platform::web::WebGame`.
//! Natively this runs a headless autopilot session and prints the result.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use sky_ascent::consts::NOMINAL_DT;
    use sky_ascent::highscores::Leaderboard;
    use sky_ascent::sim::{Feedback, RunSummary};
    use sky_ascent::{Game, GameObserver, HighScores, HostState, Settings};

    /// Longest demo run (simulated seconds)
    const MAX_DEMO_SECS: f32 = 600.0;

    /// Logs what a real host would draw
    #[derive(Default)]
    struct LogObserver {
        summary: Option<RunSummary>,
    }

    impl GameObserver for LogObserver {
        fn on_game_state_change(&mut self, state: HostState) {
            log::info!("State: {}", state.as_str());
        }

        fn on_game_end(&mut self, summary: &RunSummary) {
            self.summary = Some(summary.clone());
        }

        fn on_feedback(&mut self, feedback: &Feedback) {
            match feedback {
                Feedback::LevelUp(level) => log::info!("Level {level}"),
                Feedback::ZoneTransition(zone) => log::info!("Entering {}", zone.as_str()),
                Feedback::WaveStarted(kind) => log::debug!("Wave: {kind:?}"),
                _ => {}
            }
        }
    }

    pub fn run(seed: u64) {
        let mut game = Game::new(seed, LogObserver::default());
        game.set_settings(Settings {
            autopilot: true,
            ..Settings::load()
        });
        game.set_leaderboard(Box::new(HighScores::load()));

        game.start();
        let max_frames = (MAX_DEMO_SECS / NOMINAL_DT) as u32;
        for _ in 0..max_frames {
            game.frame(NOMINAL_DT);
            if game.observer().summary.is_some() {
                break;
            }
        }

        match &game.observer().summary {
            Some(summary) => {
                println!(
                    "Run over: {} | score {} | altitude {} | {}s",
                    summary.reason, summary.score, summary.altitude, summary.elapsed_secs
                );
                if let Some(rank) = game.last_rank() {
                    println!("Leaderboard rank #{rank}");
                }
            }
            None => println!(
                "Demo stopped after {MAX_DEMO_SECS}s, score {}",
                game.state().session.score
            ),
        }
        game.destroy();

        let mut board = HighScores::load();
        match board.top(10) {
            Ok(top) if !top.is_empty() => {
                for (i, entry) in top.iter().enumerate() {
                    println!("{:>2}. {:>8}  alt {}", i + 1, entry.score, entry.altitude);
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Could not read leaderboard: {e}"),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Sky Ascent (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::init
}
