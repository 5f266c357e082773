//! Game settings and preferences
//!
//! Match state is fully ephemeral; only these preferences persist, in
//! LocalStorage on wasm.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

/// Player preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Default bot difficulty for PvE matches
    pub bot_difficulty: Difficulty,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute when the window loses focus
    pub mute_on_blur: bool,

    // === Visual effects ===
    /// Particle effects (sparks, shards, clouds)
    pub particles: bool,
    /// Reduced motion (skip the slow-motion round-end window)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_difficulty: Difficulty::Medium,
            master_volume: 0.8,
            sfx_volume: 1.0,
            mute_on_blur: true,
            particles: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "crystal_clash_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
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
    fn test_defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.bot_difficulty, Difficulty::Medium);
        assert!(s.master_volume > 0.0 && s.master_volume <= 1.0);
        assert!(s.particles);
    }

    #[test]
    fn test_settings_round_trip_through_json() {
        let mut s = Settings::default();
        s.bot_difficulty = Difficulty::Hard;
        s.master_volume = 0.25;
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bot_difficulty, Difficulty::Hard);
        assert_eq!(back.master_volume, 0.25);
    }
}
