use crate::signs::service::ServiceConfig;
use crate::signs::session::SessionConfig;
use crate::signs::tables::{TablePaths, MAPPINGS_FILE, SIGNS_FILE, TECHNIQUES_FILE};
use crate::signs::techniques::Locale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    ConfidenceThreshold(f32),
    ZeroChatteringCheck,
    ZeroDisplay,
    HistoryShorterThanDisplay { display: usize, history: usize },
    NonPositiveInterval { field: &'static str, value: f64 },
    IntervalOutOfRange { field: &'static str, value: f64 },
    ZeroTargetFps,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::ConfidenceThreshold(value) => {
                write!(f, "confidence_threshold must be within 0..=1, got {value}")
            }
            SettingsError::ZeroChatteringCheck => write!(f, "chattering_check must be at least 1"),
            SettingsError::ZeroDisplay => write!(f, "sign_max_display must be at least 1"),
            SettingsError::HistoryShorterThanDisplay { display, history } => write!(
                f,
                "sign_max_history ({history}) must not be shorter than sign_max_display ({display})"
            ),
            SettingsError::NonPositiveInterval { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
            SettingsError::IntervalOutOfRange { field, value } => {
                write!(f, "{field} is too large, got {value}")
            }
            SettingsError::ZeroTargetFps => write!(f, "target_fps must be at least 1"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Settings {
    /// Detections scoring below this are ignored.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Number of identical consecutive classifications needed to accept a
    /// sign.
    #[serde(default = "default_chattering_check")]
    pub chattering_check: usize,
    #[serde(default = "default_sign_max_display")]
    pub sign_max_display: usize,
    #[serde(default = "default_sign_max_history")]
    pub sign_max_history: usize,
    /// Seconds without a new sign before the sequences are cleared.
    #[serde(default = "default_sign_interval_secs")]
    pub sign_interval_secs: f64,
    /// Seconds a matched technique stays in the footer.
    #[serde(default = "default_technique_display_secs")]
    pub technique_display_secs: f64,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// Number of tick intervals averaged for the FPS readout.
    #[serde(default = "default_fps_window")]
    pub fps_window: usize,
    /// When enabled the logger runs at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Table locations. Relative paths resolve against the settings file's
    /// directory.
    #[serde(default = "default_signs_path")]
    pub signs_path: PathBuf,
    #[serde(default = "default_techniques_path")]
    pub techniques_path: PathBuf,
    #[serde(default = "default_mappings_path")]
    pub mappings_path: PathBuf,
    /// Log actions instead of injecting keystrokes.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_confidence_threshold() -> f32 {
    0.7
}

fn default_chattering_check() -> usize {
    1
}

fn default_sign_max_display() -> usize {
    18
}

fn default_sign_max_history() -> usize {
    44
}

fn default_sign_interval_secs() -> f64 {
    2.0
}

fn default_technique_display_secs() -> f64 {
    5.0
}

fn default_target_fps() -> u32 {
    30
}

fn default_fps_window() -> usize {
    crate::signs::fps::DEFAULT_FPS_WINDOW
}

fn default_signs_path() -> PathBuf {
    PathBuf::from(SIGNS_FILE)
}

fn default_techniques_path() -> PathBuf {
    PathBuf::from(TECHNIQUES_FILE)
}

fn default_mappings_path() -> PathBuf {
    PathBuf::from(MAPPINGS_FILE)
}

// Unvalidated values fall back to the default instead of panicking.
fn seconds(value: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            chattering_check: default_chattering_check(),
            sign_max_display: default_sign_max_display(),
            sign_max_history: default_sign_max_history(),
            sign_interval_secs: default_sign_interval_secs(),
            technique_display_secs: default_technique_display_secs(),
            locale: Locale::default(),
            target_fps: default_target_fps(),
            fps_window: default_fps_window(),
            debug_logging: false,
            log_file: None,
            signs_path: default_signs_path(),
            techniques_path: default_techniques_path(),
            mappings_path: default_mappings_path(),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing or empty file yields defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SettingsError::ConfidenceThreshold(self.confidence_threshold));
        }
        if self.chattering_check == 0 {
            return Err(SettingsError::ZeroChatteringCheck);
        }
        if self.sign_max_display == 0 {
            return Err(SettingsError::ZeroDisplay);
        }
        if self.sign_max_history < self.sign_max_display {
            return Err(SettingsError::HistoryShorterThanDisplay {
                display: self.sign_max_display,
                history: self.sign_max_history,
            });
        }
        for (field, value) in [
            ("sign_interval_secs", self.sign_interval_secs),
            ("technique_display_secs", self.technique_display_secs),
        ] {
            if !(value > 0.0) {
                return Err(SettingsError::NonPositiveInterval { field, value });
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(SettingsError::IntervalOutOfRange { field, value });
            }
        }
        if self.target_fps == 0 {
            return Err(SettingsError::ZeroTargetFps);
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            confidence_threshold: self.confidence_threshold,
            chattering_check: self.chattering_check,
            max_display: self.sign_max_display,
            max_history: self.sign_max_history,
            sign_interval: seconds(self.sign_interval_secs, default_sign_interval_secs()),
            technique_display: seconds(
                self.technique_display_secs,
                default_technique_display_secs(),
            ),
            locale: self.locale,
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            session: self.session_config(),
            target_fps: self.target_fps,
            fps_window: self.fps_window,
        }
    }

    /// Table paths, resolved against the directory holding `settings_path`.
    pub fn table_paths(&self, settings_path: &Path) -> TablePaths {
        let base = settings_path.parent().unwrap_or_else(|| Path::new("."));
        TablePaths {
            signs: base.join(&self.signs_path),
            techniques: base.join(&self.techniques_path),
            mappings: base.join(&self.mappings_path),
        }
    }
}
