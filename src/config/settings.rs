use bevy_ecs::prelude::Resource;
use log::debug;
use serde::{Deserialize, Serialize};

// Player-facing preferences. The engine carries them for the presentation
// layer and broadcasts changes; it never reads them during play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub accessibility: AccessibilitySettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub muted: bool,
    pub music_volume: f32,
    pub hit_volume: f32,
    pub success_volume: f32,
    pub combo_volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: false,
            music_volume: 0.3,
            hit_volume: 0.3,
            success_volume: 0.5,
            combo_volume: 0.6,
        }
    }
}

impl AudioSettings {
    // Volumes live in 0.0..=1.0
    pub fn clamp(&mut self) {
        for volume in [
            &mut self.music_volume,
            &mut self.hit_volume,
            &mut self.success_volume,
            &mut self.combo_volume,
        ] {
            *volume = volume.clamp(0.0, 1.0);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AccessibilitySettings {
    pub color_blind_mode: bool,
    pub high_contrast_mode: bool,
    pub reduced_motion: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub zoom_level: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { zoom_level: 1.0 }
    }
}

type SettingsListener = Box<dyn Fn(&Settings) + Send + Sync>;

/// Current settings plus the callbacks that want to hear about changes.
#[derive(Resource, Default)]
pub struct SettingsHub {
    settings: Settings,
    listeners: Vec<SettingsListener>,
}

impl SettingsHub {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe(&mut self, listener: impl Fn(&Settings) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Applies `change` and notifies listeners if anything actually changed.
    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) -> bool {
        let mut next = self.settings.clone();
        change(&mut next);
        next.audio.clamp();
        if next == self.settings {
            return false;
        }
        self.settings = next;
        debug!("Settings changed, notifying {} listeners", self.listeners.len());
        for listener in &self.listeners {
            listener(&self.settings);
        }
        true
    }
}
