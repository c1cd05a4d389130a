use crate::gestures::filter::FilterConfig;
use crate::gestures::recognizer::RecognizerConfig;
use crate::gestures::trail::TrailConfig;
use serde::{Deserialize, Serialize};

pub const SETTINGS_FILE: &str = "gesture_settings.json";
pub const SCHEMA_VERSION: u32 = 1;

/// Configuration surface supplied by the host's settings layer. Fields left
/// out of the file fall back to defaults so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GestureSettings {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Master switch for gesture handling in the host.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// When enabled the host initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Draw the smoothed trail while a gesture is in progress.
    #[serde(default = "default_true")]
    pub show_trail: bool,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub trail: TrailConfig,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            enabled: true,
            debug_logging: false,
            show_trail: true,
            recognizer: RecognizerConfig::default(),
            filter: FilterConfig::default(),
            trail: TrailConfig::default(),
        }
    }
}

impl GestureSettings {
    /// Rejects invalid numeric configuration up front, before it can degrade
    /// a live gesture.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.recognizer.validate()?;
        self.filter.validate()?;
        self.trail.validate()?;
        Ok(())
    }
}

pub fn load_settings(path: &str) -> anyhow::Result<GestureSettings> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    if content.trim().is_empty() {
        return Ok(GestureSettings::default());
    }
    let settings: GestureSettings = serde_json::from_str(&content)?;
    if settings.schema_version != SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Unsupported settings schema version {}",
            settings.schema_version
        ));
    }
    settings.validate()?;
    Ok(settings)
}

pub fn save_settings(path: &str, settings: &GestureSettings) -> anyhow::Result<()> {
    let mut settings = settings.clone();
    settings.schema_version = SCHEMA_VERSION;
    let json = serde_json::to_string_pretty(&settings)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}
