//! Turret configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock turret: tilt servo centered at 90° moving in 10° steps, pan servo
//! centered at 1500 with 1540/1470 for left/right, no hardware attached.

use crate::control::RepeatPolicy;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "TURRET_CONFIG";
const CONFIG_FILE: &str = "turret.toml";

/// Hard mechanical range of the tilt servo in degrees.
pub const TILT_RANGE: (i32, i32) = (0, 180);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub control: ControlConfig,
    pub sink: SinkConfig,
    pub camera: CameraConfig,
    pub vision: VisionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub tilt: TiltConfig,
    pub pan: PanConfig,
    pub repeat: RepeatPolicy,
}

/// Channel 1: angle servo driven by up/down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TiltConfig {
    pub initial: i32,
    pub step: i32,
    pub min: i32,
    pub max: i32,
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            initial: 90,
            step: 10,
            min: TILT_RANGE.0,
            max: TILT_RANGE.1,
        }
    }
}

/// Channel 2: pulse servo driven by left/right, recentered on release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanConfig {
    pub center: i32,
    pub left: i32,
    pub right: i32,
}

impl Default for PanConfig {
    fn default() -> Self {
        Self {
            center: 1500,
            left: 1540,
            right: 1470,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log commands and drop them.
    #[default]
    Null,
    Serial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub kind: SinkKind,
    /// Serial device, e.g. `/dev/ttyUSB0` or `COM6`.
    pub port: Option<PathBuf>,
    pub baud_rate: u32,
    pub write_timeout_ms: u64,
    /// Commands buffered ahead of the writer thread before sends are dropped.
    pub queue_depth: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Null,
            port: None,
            baud_rate: 9600,
            write_timeout_ms: 100,
            queue_depth: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub device: i32,
    pub width: u32,
    pub height: u32,
    /// Mirror the image horizontally.
    pub flip: bool,
    pub tick_ms: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: 0,
            width: 640,
            height: 480,
            flip: false,
            tick_ms: 30,
        }
    }
}

/// Cascade shipped with OpenCV, looked up in its data directory when the
/// path does not exist as given.
pub const DEFAULT_FACE_CASCADE: &str = "haarcascades/haarcascade_frontalface_default.xml";

/// How target blobs are segmented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetMode {
    /// Small points standing out from their neighbourhood (adaptive threshold).
    #[default]
    Stars,
    /// Pixels inside the HSV window.
    Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Haar cascade XML for face detection. `None` turns faces off.
    pub face_cascade: Option<PathBuf>,
    pub targets: bool,
    pub target_mode: TargetMode,
    /// (H, S, V), color mode only
    pub lower_bound: (u8, u8, u8),
    /// (H, S, V), color mode only
    pub upper_bound: (u8, u8, u8),
    /// Blobs must be strictly larger than this, in pixels.
    pub min_target_area: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            face_cascade: Some(PathBuf::from(DEFAULT_FACE_CASCADE)),
            targets: true,
            target_mode: TargetMode::Stars,
            lower_bound: (0, 0, 0),
            upper_bound: (255, 255, 255),
            min_target_area: 10.0,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `$TURRET_CONFIG`, then `./turret.toml`, then built-in defaults.
    pub fn locate() -> crate::Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::load(local);
        }

        tracing::info!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn validate(&self) -> crate::Result<()> {
        let tilt = &self.control.tilt;
        if tilt.min < TILT_RANGE.0 || tilt.max > TILT_RANGE.1 {
            return Err(invalid(format!(
                "tilt range {}..={} exceeds {}..={}",
                tilt.min, tilt.max, TILT_RANGE.0, TILT_RANGE.1
            )));
        }
        if tilt.min > tilt.max {
            return Err(invalid(format!(
                "tilt min {} is above max {}",
                tilt.min, tilt.max
            )));
        }
        if !(tilt.min..=tilt.max).contains(&tilt.initial) {
            return Err(invalid(format!(
                "tilt initial {} is outside {}..={}",
                tilt.initial, tilt.min, tilt.max
            )));
        }
        if tilt.step < 0 || tilt.step > tilt.max - tilt.min {
            return Err(invalid(format!(
                "tilt step {} is outside 0..={}",
                tilt.step,
                tilt.max - tilt.min
            )));
        }
        if self.camera.tick_ms == 0 {
            return Err(invalid("camera tick_ms must be positive".to_string()));
        }
        if self.sink.queue_depth == 0 {
            return Err(invalid("sink queue_depth must be positive".to_string()));
        }
        if self.sink.kind == SinkKind::Serial && self.sink.port.is_none() {
            return Err(invalid("serial sink requires a port".to_string()));
        }

        Ok(())
    }
}

fn invalid(msg: String) -> Error {
    Error::InvalidConfig(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.control.tilt.initial, 90);
        assert_eq!(config.control.tilt.step, 10);
        assert_eq!(config.control.pan.center, 1500);
        assert_eq!(config.control.pan.left, 1540);
        assert_eq!(config.control.pan.right, 1470);
        assert_eq!(config.control.repeat, RepeatPolicy::Resend);
        assert_eq!(config.sink.kind, SinkKind::Null);
        assert_eq!(config.camera.tick_ms, 30);
        assert_eq!(config.vision.target_mode, TargetMode::Stars);
        assert_eq!(
            config.vision.face_cascade.as_deref(),
            Some(Path::new(DEFAULT_FACE_CASCADE))
        );
    }

    #[test]
    fn test_vision_overrides() {
        let config = Config::from_toml_str(
            r#"
            [vision]
            target_mode = "color"
            lower_bound = [20, 100, 100]
            "#,
        )
        .unwrap();

        assert_eq!(config.vision.target_mode, TargetMode::Color);
        assert_eq!(config.vision.lower_bound, (20, 100, 100));
        assert!(config.vision.targets);
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
            [control]
            repeat = "suppress"

            [control.tilt]
            step = 5

            [sink]
            kind = "serial"
            port = "/dev/ttyUSB0"
            "#,
        )
        .unwrap();

        assert_eq!(config.control.repeat, RepeatPolicy::Suppress);
        assert_eq!(config.control.tilt.step, 5);
        assert_eq!(config.control.tilt.initial, 90);
        assert_eq!(config.sink.kind, SinkKind::Serial);
        assert_eq!(config.sink.baud_rate, 9600);
    }

    #[test]
    fn test_rejects_tilt_outside_range() {
        let result = Config::from_toml_str("[control.tilt]\nmax = 200\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_initial_outside_bounds() {
        let result = Config::from_toml_str("[control.tilt]\nmin = 30\nmax = 60\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_step_wider_than_range() {
        let result = Config::from_toml_str("[control.tilt]\nstep = 2147483647\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let result = Config::from_toml_str("[control.tilt]\nstep = -1\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));

        let config = Config::from_toml_str("[control.tilt]\nstep = 180\n").unwrap();
        assert_eq!(config.control.tilt.step, 180);
    }

    #[test]
    fn test_rejects_serial_without_port() {
        let result = Config::from_toml_str("[sink]\nkind = \"serial\"\n");
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = Config::from_toml_str("[control\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[camera]\ndevice = 2\nflip = true").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.camera.device, 2);
        assert!(config.camera.flip);
        assert_eq!(config.camera.width, 640);
    }
}
