use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::control::ControlConfig;
use crate::display::DisplayMode;

const DEFAULT_CAMERA_DEVICE: &str = "stub://camera";
const DEFAULT_CAMERA_FPS: u32 = 10;
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 1000;
const DEFAULT_CLASSIFIER_BACKEND: &str = "stub";
const DEFAULT_TURN_ANGLE_DEG: f32 = 10.0;
const DEFAULT_LATERAL_CORR_ANGLE_DEG: f32 = 10.0;
const DEFAULT_INNOVATION_COEFF: f32 = 1.0;
const DEFAULT_ACTIVE_CLASS_COUNT: u8 = 6;

#[derive(Debug, Deserialize, Default)]
struct PilotConfigFile {
    camera: Option<CameraConfigFile>,
    classifier: Option<ClassifierConfigFile>,
    control: Option<ControlConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    capture_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassifierConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_width: Option<u32>,
    input_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ControlConfigFile {
    turn_angle_deg: Option<f32>,
    lateral_corr_angle_deg: Option<f32>,
    innovation_coeff: Option<f32>,
    active_class_count: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    mode: Option<String>,
}

/// Complete daemon configuration: defaults, overridden by a JSON config
/// file, overridden by `TRAILSTEER_*` environment variables, validated.
#[derive(Debug, Clone)]
pub struct PilotConfig {
    pub camera: CameraSettings,
    pub classifier: ClassifierSettings,
    pub control: ControlConfig,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    pub capture_timeout_ms: u64,
}

impl CameraSettings {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
    /// Model input dimensions; frames are expected at this size.
    pub input_width: u32,
    pub input_height: u32,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_CLASSIFIER_BACKEND.to_string(),
            model_path: None,
            input_width: DEFAULT_CAMERA_WIDTH,
            input_height: DEFAULT_CAMERA_HEIGHT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub mode: DisplayMode,
}

impl PilotConfig {
    /// Load configuration: explicit path, else `TRAILSTEER_CONFIG`, else
    /// defaults; environment overrides applied last.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("TRAILSTEER_CONFIG").ok();
        let file_cfg = match config_path {
            Some(path) => Some(read_config_file(path)?),
            None => match env_path.as_deref() {
                Some(path) => Some(read_config_file(Path::new(path))?),
                None => None,
            },
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PilotConfigFile) -> Result<Self> {
        let camera = CameraSettings {
            device: file
                .camera
                .as_ref()
                .and_then(|camera| camera.device.clone())
                .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
            target_fps: file
                .camera
                .as_ref()
                .and_then(|camera| camera.target_fps)
                .unwrap_or(DEFAULT_CAMERA_FPS),
            width: file
                .camera
                .as_ref()
                .and_then(|camera| camera.width)
                .unwrap_or(DEFAULT_CAMERA_WIDTH),
            height: file
                .camera
                .as_ref()
                .and_then(|camera| camera.height)
                .unwrap_or(DEFAULT_CAMERA_HEIGHT),
            capture_timeout_ms: file
                .camera
                .as_ref()
                .and_then(|camera| camera.capture_timeout_ms)
                .unwrap_or(DEFAULT_CAPTURE_TIMEOUT_MS),
        };
        let classifier = ClassifierSettings {
            backend: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.backend.clone())
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_BACKEND.to_string()),
            model_path: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.model_path.clone()),
            input_width: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.input_width)
                .unwrap_or(camera.width),
            input_height: file
                .classifier
                .as_ref()
                .and_then(|classifier| classifier.input_height)
                .unwrap_or(camera.height),
        };
        let control = ControlConfig {
            turn_angle_deg: file
                .control
                .as_ref()
                .and_then(|control| control.turn_angle_deg)
                .unwrap_or(DEFAULT_TURN_ANGLE_DEG),
            lateral_corr_angle_deg: file
                .control
                .as_ref()
                .and_then(|control| control.lateral_corr_angle_deg)
                .unwrap_or(DEFAULT_LATERAL_CORR_ANGLE_DEG),
            innovation_coeff: file
                .control
                .as_ref()
                .and_then(|control| control.innovation_coeff)
                .unwrap_or(DEFAULT_INNOVATION_COEFF),
            active_class_count: file
                .control
                .as_ref()
                .and_then(|control| control.active_class_count)
                .unwrap_or(DEFAULT_ACTIVE_CLASS_COUNT),
        };
        let display = DisplaySettings {
            mode: match file.display.and_then(|display| display.mode) {
                Some(mode) => DisplayMode::parse(&mode)?,
                None => DisplayMode::Auto,
            },
        };
        Ok(Self {
            camera,
            classifier,
            control,
            display,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("TRAILSTEER_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(backend) = std::env::var("TRAILSTEER_CLASSIFIER_BACKEND") {
            if !backend.trim().is_empty() {
                self.classifier.backend = backend;
            }
        }
        if let Ok(path) = std::env::var("TRAILSTEER_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.classifier.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(coeff) = std::env::var("TRAILSTEER_INNOVATION_COEFF") {
            self.control.innovation_coeff = coeff
                .parse()
                .map_err(|_| anyhow!("TRAILSTEER_INNOVATION_COEFF must be a number"))?;
        }
        if let Ok(count) = std::env::var("TRAILSTEER_ACTIVE_CLASS_COUNT") {
            self.control.active_class_count = count
                .parse()
                .map_err(|_| anyhow!("TRAILSTEER_ACTIVE_CLASS_COUNT must be an integer"))?;
        }
        if let Ok(mode) = std::env::var("TRAILSTEER_DISPLAY") {
            if !mode.trim().is_empty() {
                self.display.mode = DisplayMode::parse(&mode)?;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.camera.target_fps == 0 {
            return Err(anyhow!("camera target_fps must be greater than zero"));
        }
        if self.camera.capture_timeout_ms == 0 {
            return Err(anyhow!("camera capture_timeout_ms must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.control.innovation_coeff) {
            return Err(anyhow!(
                "innovation_coeff must be within [0, 1], got {}",
                self.control.innovation_coeff
            ));
        }
        if !matches!(self.control.active_class_count, 3 | 6) {
            return Err(anyhow!(
                "active_class_count must be 3 or 6, got {}",
                self.control.active_class_count
            ));
        }
        if !self.control.turn_angle_deg.is_finite()
            || !self.control.lateral_corr_angle_deg.is_finite()
        {
            return Err(anyhow!("control angles must be finite"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<PilotConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
