use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TintcamConfig {
    pub camera: CameraConfig,
    pub detector: DetectorConfig,
    pub overlay: OverlayConfig,
    pub telemetry: TelemetryConfig,
    pub monitor: MonitorConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DetectorConfig {
    /// Path to the pretrained Haar cascade model
    #[serde(default = "default_cascade_path")]
    pub cascade_path: String,

    /// Run detection every Nth frame
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u64,

    /// Image pyramid scale factor
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Minimum neighbor count for a detection to be kept
    #[serde(default = "default_min_neighbors")]
    pub min_neighbors: i32,

    /// Minimum detection size in pixels (square)
    #[serde(default = "default_min_size")]
    pub min_size: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OverlayConfig {
    /// Path to TrueType font file for the status text
    #[serde(default = "default_font_path")]
    pub font_path: String,

    /// Font size for the status text
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelemetryConfig {
    /// CPU tick counter source
    #[serde(default = "default_stat_path")]
    pub stat_path: String,

    /// Memory counter source
    #[serde(default = "default_meminfo_path")]
    pub meminfo_path: String,

    /// Refresh CPU usage every frame_skip * this many frames
    #[serde(default = "default_cpu_refresh_multiplier")]
    pub cpu_refresh_multiplier: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonitorConfig {
    /// Host pinged by the reachability probe
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    /// Seconds between probe cycles
    #[serde(default = "default_monitor_interval")]
    pub interval_seconds: u64,

    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DisplayConfig {
    /// Window title
    #[serde(default = "default_window_title")]
    pub window_title: String,

    /// Bounded keypress poll per frame, in milliseconds
    #[serde(default = "default_key_poll_ms")]
    pub key_poll_ms: u64,

    /// Fixed delay between iterations, in milliseconds
    #[serde(default = "default_frame_delay_ms")]
    pub frame_delay_ms: u64,
}

fn default_camera_index() -> i32 {
    0
}

fn default_cascade_path() -> String {
    "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml".to_string()
}

fn default_frame_skip() -> u64 {
    3
}

fn default_scale_factor() -> f64 {
    1.1
}

fn default_min_neighbors() -> i32 {
    4
}

fn default_min_size() -> i32 {
    30
}

fn default_font_path() -> String {
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string()
}

fn default_font_size() -> f32 {
    16.0
}

fn default_stat_path() -> String {
    "/proc/stat".to_string()
}

fn default_meminfo_path() -> String {
    "/proc/meminfo".to_string()
}

fn default_cpu_refresh_multiplier() -> u64 {
    5
}

fn default_probe_host() -> String {
    "8.8.8.8".to_string()
}

fn default_monitor_interval() -> u64 {
    5
}

fn default_probe_timeout() -> u64 {
    2
}

fn default_window_title() -> String {
    "Red-Tinted Face Detection".to_string()
}

fn default_key_poll_ms() -> u64 {
    10
}

fn default_frame_delay_ms() -> u64 {
    50
}

impl TintcamConfig {
    /// Load configuration from the default sources (file + environment)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("tintcam.toml")
    }

    /// Load configuration from a specific file path, which may be absent
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("camera.index", default_camera_index() as i64)?
            .set_default("detector.cascade_path", default_cascade_path())?
            .set_default("detector.frame_skip", default_frame_skip() as i64)?
            .set_default("detector.scale_factor", default_scale_factor())?
            .set_default("detector.min_neighbors", default_min_neighbors() as i64)?
            .set_default("detector.min_size", default_min_size() as i64)?
            .set_default("overlay.font_path", default_font_path())?
            .set_default("overlay.font_size", default_font_size() as f64)?
            .set_default("telemetry.stat_path", default_stat_path())?
            .set_default("telemetry.meminfo_path", default_meminfo_path())?
            .set_default(
                "telemetry.cpu_refresh_multiplier",
                default_cpu_refresh_multiplier() as i64,
            )?
            .set_default("monitor.probe_host", default_probe_host())?
            .set_default("monitor.interval_seconds", default_monitor_interval() as i64)?
            .set_default("monitor.timeout_seconds", default_probe_timeout() as i64)?
            .set_default("display.window_title", default_window_title())?
            .set_default("display.key_poll_ms", default_key_poll_ms() as i64)?
            .set_default("display.frame_delay_ms", default_frame_delay_ms() as i64)?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(Environment::with_prefix("TINTCAM").separator("__"))
            .build()?;

        let config: TintcamConfig = settings.try_deserialize()?;
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detector.frame_skip == 0 {
            return Err(ConfigError::Message(
                "detector.frame_skip must be greater than 0".to_string(),
            ));
        }

        if self.detector.scale_factor <= 1.0 {
            return Err(ConfigError::Message(
                "detector.scale_factor must be greater than 1.0".to_string(),
            ));
        }

        if self.detector.min_size <= 0 {
            return Err(ConfigError::Message(
                "detector.min_size must be greater than 0".to_string(),
            ));
        }

        if self.overlay.font_size <= 0.0 {
            return Err(ConfigError::Message(
                "overlay.font_size must be greater than 0".to_string(),
            ));
        }

        if self.telemetry.cpu_refresh_multiplier == 0 {
            return Err(ConfigError::Message(
                "telemetry.cpu_refresh_multiplier must be greater than 0".to_string(),
            ));
        }

        if self.monitor.interval_seconds == 0 {
            return Err(ConfigError::Message(
                "monitor.interval_seconds must be greater than 0".to_string(),
            ));
        }

        if self.monitor.probe_host.is_empty() {
            return Err(ConfigError::Message(
                "monitor.probe_host must not be empty".to_string(),
            ));
        }

        if self.display.window_title.is_empty() {
            return Err(ConfigError::Message(
                "display.window_title must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for TintcamConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                index: default_camera_index(),
            },
            detector: DetectorConfig::default(),
            overlay: OverlayConfig::default(),
            telemetry: TelemetryConfig::default(),
            monitor: MonitorConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cascade_path: default_cascade_path(),
            frame_skip: default_frame_skip(),
            scale_factor: default_scale_factor(),
            min_neighbors: default_min_neighbors(),
            min_size: default_min_size(),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            font_path: default_font_path(),
            font_size: default_font_size(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            stat_path: default_stat_path(),
            meminfo_path: default_meminfo_path(),
            cpu_refresh_multiplier: default_cpu_refresh_multiplier(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_host: default_probe_host(),
            interval_seconds: default_monitor_interval(),
            timeout_seconds: default_probe_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            key_poll_ms: default_key_poll_ms(),
            frame_delay_ms: default_frame_delay_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = TintcamConfig::default();
        assert_eq!(config.camera.index, 0);
        assert_eq!(config.detector.frame_skip, 3);
        assert_eq!(config.detector.scale_factor, 1.1);
        assert_eq!(config.detector.min_neighbors, 4);
        assert_eq!(config.detector.min_size, 30);
        assert_eq!(config.telemetry.cpu_refresh_multiplier, 5);
        assert_eq!(config.monitor.interval_seconds, 5);
        assert_eq!(config.display.key_poll_ms, 10);
        assert_eq!(config.display.frame_delay_ms, 50);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TintcamConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = TintcamConfig::load_from_file("/nonexistent/tintcam.toml").unwrap();
        assert_eq!(config.detector.frame_skip, 3);
        assert_eq!(config.monitor.probe_host, "8.8.8.8");
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tintcam.toml");
        std::fs::write(
            &path,
            "[detector]\nframe_skip = 5\n\n[monitor]\nprobe_host = \"1.1.1.1\"\n",
        )
        .unwrap();

        let config = TintcamConfig::load_from_file(&path).unwrap();
        assert_eq!(config.detector.frame_skip, 5);
        assert_eq!(config.monitor.probe_host, "1.1.1.1");
        // Untouched sections keep their defaults
        assert_eq!(config.display.frame_delay_ms, 50);
    }

    #[test]
    fn test_validate_rejects_zero_frame_skip() {
        let mut config = TintcamConfig::default();
        config.detector.frame_skip = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scale_factor() {
        let mut config = TintcamConfig::default();
        config.detector.scale_factor = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_probe_host() {
        let mut config = TintcamConfig::default();
        config.monitor.probe_host = String::new();
        assert!(config.validate().is_err());
    }
}
