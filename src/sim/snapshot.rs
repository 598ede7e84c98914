//! Read-only per-frame view for renderers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::events::HostState;
use super::physics::BuffKind;
use super::spawn::{EnvZone, SpecialZone, WaveKind};
use super::state::{EntityKind, Facing, GameState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalloonView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub fuel: f32,
    pub buffs: Vec<BuffKind>,
    pub wind_direction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub kind: EntityKind,
    pub pos: Vec2,
    /// On-screen sprite size
    pub size: Vec2,
    pub facing: Facing,
    pub texture: String,
    pub special: bool,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub state: HostState,
    pub countdown: u8,
    pub balloon: BalloonView,
    pub entities: Vec<EntityView>,
    pub zone: EnvZone,
    pub wave: Option<WaveKind>,
    pub special_zones: Vec<SpecialZone>,
    pub score: u64,
    pub altitude: u32,
    pub level: u32,
    pub elapsed_secs: u32,
}

impl FrameSnapshot {
    pub fn capture(state: &GameState) -> Self {
        let b = &state.balloon;
        Self {
            state: state.phase.host_state(),
            countdown: state.countdown,
            balloon: BalloonView {
                pos: b.pos,
                vel: b.vel,
                fuel: b.fuel,
                buffs: b.buffs.iter().map(|buff| buff.kind).collect(),
                wind_direction: b.wind_direction,
            },
            entities: state
                .pool
                .iter_active()
                .map(|(_, e)| EntityView {
                    kind: e.kind,
                    pos: e.pos,
                    size: e.visual_size(),
                    facing: e.facing,
                    texture: e.texture.clone(),
                    special: e.special,
                })
                .collect(),
            zone: state.spawner.zone,
            wave: state.spawner.wave.map(|w| w.kind),
            special_zones: state.spawner.zones.clone(),
            score: state.session.score,
            altitude: state.session.altitude,
            level: state.difficulty.level,
            elapsed_secs: state.session.elapsed_secs(),
        }
    }
}
