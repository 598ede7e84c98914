//! Player settings and preferences
//!
//! Persisted separately from high scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::sim::Feedback;

/// Player settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Feedback ===
    /// Camera shake on impacts and deflects
    pub screen_shake: bool,
    /// Vibration on supported devices
    pub haptics: bool,
    /// Collection bursts, combo popups and similar particle effects
    pub particles: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Gameplay ===
    /// Let the game steer (demo/attract mode)
    pub autopilot: bool,
    /// Pause automatically when the page is hidden
    pub pause_on_hide: bool,

    // === Accessibility ===
    /// Reduced motion (no shake, no zone flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_shake: true,
            haptics: true,
            particles: true,
            show_fps: false,
            autopilot: false,
            pause_on_hide: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Whether a presentation cue should reach the host
    pub fn allows(&self, feedback: &Feedback) -> bool {
        match feedback {
            Feedback::CameraShake(_) => self.effective_screen_shake(),
            Feedback::Haptic(_) => self.haptics,
            Feedback::CollectionBurst { .. }
            | Feedback::Deflect { .. }
            | Feedback::DamageBurst { .. }
            | Feedback::ComboPopup { .. } => self.particles,
            Feedback::ZoneTransition(_) => !self.reduced_motion,
            _ => true,
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "sky_ascent_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_suppresses_shake() {
        let mut s = Settings::default();
        assert!(s.allows(&Feedback::CameraShake(1.0)));
        s.reduced_motion = true;
        assert!(!s.allows(&Feedback::CameraShake(1.0)));
        assert!(s.allows(&Feedback::Go));
    }

    #[test]
    fn test_haptics_toggle() {
        let s = Settings {
            haptics: false,
            ..Default::default()
        };
        assert!(!s.allows(&Feedback::Haptic(30)));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{"autopilot": true}"#).unwrap();
        assert!(s.autopilot);
        assert!(s.haptics);
        assert!(s.pause_on_hide);
    }
}
