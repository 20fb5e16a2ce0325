use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub detection: DetectionConfig,
    pub policy: PolicyConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Heuristic thresholds used by the signal extractor and fuser.
/// None of these are derived; they are calibrated by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub curled_fingers_min: usize,
    pub thumb_tuck_max_distance: f32,
    /// Hand bounds count as portrait when height > ratio * width.
    pub portrait_ratio: f32,
    pub pitch_down_deg: f32,
    pub iris_down_ratio: f32,
    pub iris_lid_min_gap: f32,
    pub phone_label: String,
    pub phone_min_score: f32,
    pub fusion_min_signals: usize,
    pub occlusion_shortcut: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub confirm_frames: u32,
    pub hold_ms: u64,
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub target_fps: u32,
    pub toast_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            curled_fingers_min: 3,
            thumb_tuck_max_distance: 0.35,
            portrait_ratio: 0.8,
            pitch_down_deg: 5.0,
            iris_down_ratio: 0.55,
            iris_lid_min_gap: 0.001,
            phone_label: "cell phone".to_string(),
            phone_min_score: 0.5,
            fusion_min_signals: 2,
            occlusion_shortcut: true,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            confirm_frames: 15, // ~0.5s at 30fps
            hold_ms: 2_000,
            cooldown_ms: 30_000,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_fps: 30,
            toast_ms: 4_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "sentinel.json";

    /// Loads the config at `path`, falling back to defaults when the file is
    /// missing or unreadable. The resolved config is written back so fields
    /// added since the file was created show up in it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            match serde_json::from_str::<AppConfig>(&content) {
                Ok(c) => {
                    info!("Loaded configuration from {}", path.display());
                    c
                }
                Err(e) => {
                    warn!("Error parsing config {}: {}. Loading defaults.", path.display(), e);
                    Self::default()
                }
            }
        } else {
            info!("Configuration file not found. Creating default at {}", path.display());
            Self::default()
        };

        let config = config.validated();
        config.save(path)?;
        Ok(config)
    }

    /// Raises thresholds that would let the detector confirm without evidence.
    /// A zero confirmation window or vote count would make every frame count.
    pub fn validated(mut self) -> Self {
        if self.policy.confirm_frames == 0 {
            warn!("policy.confirm_frames must be at least 1; using 1");
            self.policy.confirm_frames = 1;
        }
        if self.detection.fusion_min_signals == 0 {
            warn!("detection.fusion_min_signals must be at least 1; using 1");
            self.detection.fusion_min_signals = 1;
        }
        self
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    /// Milliseconds between scheduled ticks.
    pub fn frame_interval_ms(&self) -> u64 {
        1_000 / u64::from(self.session.target_fps.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.json");
        fs::write(&path, r#"{ "policy": { "hold_ms": 500 } }"#).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.policy.hold_ms, 500);
        assert_eq!(config.policy.confirm_frames, 15);
        assert_eq!(config.policy.cooldown_ms, 30_000);
        assert_eq!(config.detection, DetectionConfig::default());

        // Written back with every field populated.
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("cooldown_ms"));
        assert!(saved.contains("iris_down_ratio"));
    }

    #[test]
    fn garbage_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.json");
        fs::write(&path, "not json at all").unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.json");
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn zero_thresholds_are_raised_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.json");
        fs::write(
            &path,
            r#"{ "policy": { "confirm_frames": 0 }, "detection": { "fusion_min_signals": 0 } }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.policy.confirm_frames, 1);
        assert_eq!(config.detection.fusion_min_signals, 1);

        let saved: AppConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved.policy.confirm_frames, 1);
    }

    #[test]
    fn valid_thresholds_are_untouched() {
        assert_eq!(AppConfig::default().validated(), AppConfig::default());
    }

    #[test]
    fn frame_interval_guards_zero_fps() {
        let mut config = AppConfig::default();
        assert_eq!(config.frame_interval_ms(), 33);
        config.session.target_fps = 0;
        assert_eq!(config.frame_interval_ms(), 1_000);
    }
}
