//! Outbound events
//!
//! The simulation never calls the host. It queues `GameEvent`s which the
//! controller drains once per frame and dispatches to its observer.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::BuffKind;
use super::spawn::{EnvZone, WaveKind, ZoneKind};
use super::state::{ObstacleKind, PowerUpKind};

/// Lifecycle state as the host sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostState {
    Loading,
    Playing,
    Paused,
    Ended,
}

impl HostState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostState::Loading => "loading",
            HostState::Playing => "playing",
            HostState::Paused => "paused",
            HostState::Ended => "ended",
        }
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    OutOfFuel,
    HitBy(ObstacleKind),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::OutOfFuel => f.write_str("Out of fuel!"),
            EndReason::HitBy(kind) => write!(f, "Hit by {kind}!"),
        }
    }
}

/// Final result of a run, reported exactly once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub score: u64,
    pub altitude: u32,
    /// Whole seconds of active play
    pub elapsed_secs: u32,
    pub reason: String,
}

/// Presentation cues; the core never renders, it only announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feedback {
    /// Power-up collected at `pos`
    CollectionBurst { pos: Vec2, kind: PowerUpKind, points: u64 },
    /// Obstacle destroyed by the shield
    Deflect { pos: Vec2, kind: ObstacleKind, bonus: u64 },
    /// Balloon hit an obstacle
    DamageBurst { pos: Vec2 },
    /// Multiplier text for a chained pickup
    ComboPopup { count: u32, multiplier: f32 },
    /// A timed buff started or ran out
    BuffStarted(BuffKind),
    BuffEnded(BuffKind),
    /// Altitude band changed
    ZoneTransition(EnvZone),
    /// A danger or bonus zone appeared
    SpecialZone(ZoneKind),
    /// A wave formation began
    WaveStarted(WaveKind),
    LevelUp(u32),
    /// Countdown number (3, 2, 1)
    CountdownPulse(u8),
    Go,
    /// Camera shake intensity in [0, 1]
    CameraShake(f32),
    /// Vibration pattern (ms)
    Haptic(u32),
}

/// Everything the simulation tells the outside world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged(u64),
    AltitudeChanged(u32),
    FuelChanged(u8),
    TimeChanged(u32),
    StateChanged(HostState),
    GameEnded(RunSummary),
    Feedback(Feedback),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_reason_text() {
        assert_eq!(EndReason::OutOfFuel.to_string(), "Out of fuel!");
        assert_eq!(
            EndReason::HitBy(ObstacleKind::Airplane).to_string(),
            "Hit by airplane!"
        );
    }

    #[test]
    fn test_host_state_serializes_lowercase() {
        let json = serde_json::to_string(&HostState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
        assert_eq!(HostState::Ended.as_str(), "ended");
    }
}
