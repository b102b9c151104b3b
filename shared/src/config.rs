/// Tunables for pointer interaction, menu animation and audio buffering.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionConfig {
    /// Maximum ray length, also the default visual length when nothing is hit
    pub ray_distance: f32,
    /// Upper bound of the accepted normalized surface coordinate
    pub max_surface_coord: f32,
    /// A grab press attaches only to objects strictly closer than this
    pub grab_threshold: f32,
    /// Menu open/close animation length (milliseconds)
    pub menu_animation_ms: u64,
    /// Exponent of the menu ease curve
    pub menu_ease_exponent: f32,
    /// Chunks kept per remote participant before the oldest is dropped
    pub audio_queue_capacity: usize,
    /// Chunks that must be buffered before playback pulls one
    pub audio_min_buffered: usize,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            ray_distance: 10.0,
            max_surface_coord: 0.99,
            grab_threshold: 0.1,
            menu_animation_ms: 300,
            menu_ease_exponent: 0.15,
            audio_queue_capacity: 32,
            audio_min_buffered: 2,
        }
    }
}

impl InteractionConfig {
    pub fn menu_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.menu_animation_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.ray_distance.is_finite() || self.ray_distance <= 0.0 {
            return Err("ray_distance must be finite and > 0".to_string());
        }
        if !(self.max_surface_coord > 0.0 && self.max_surface_coord <= 1.0) {
            return Err("max_surface_coord must be in (0, 1]".to_string());
        }
        if !self.grab_threshold.is_finite() || self.grab_threshold <= 0.0 {
            return Err("grab_threshold must be finite and > 0".to_string());
        }
        if self.menu_animation_ms == 0 {
            return Err("menu_animation_ms must be > 0".to_string());
        }
        if !self.menu_ease_exponent.is_finite() || self.menu_ease_exponent <= 0.0 {
            return Err("menu_ease_exponent must be finite and > 0".to_string());
        }
        if self.audio_queue_capacity == 0 {
            return Err("audio_queue_capacity must be > 0".to_string());
        }
        if self.audio_min_buffered > self.audio_queue_capacity {
            return Err("audio_min_buffered must be <= audio_queue_capacity".to_string());
        }
        Ok(())
    }
}
