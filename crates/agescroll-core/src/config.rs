use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::media::{PhotoId, TimelineEvent};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub reveal: RevealConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file, downloads)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the image store API
    #[serde(default = "default_store_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Retries for 429/503 responses (0 = fail on first)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
            request_timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Title shown above the timeline
    #[serde(default = "default_title")]
    pub title: String,
    /// Theme name: "gruvbox-dark" or "gruvbox-light"
    #[serde(default = "default_theme_name")]
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            title: default_title(),
            theme: default_theme_name(),
        }
    }
}

/// Easing curve applied to scroll and reveal animations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    /// Jump straight to the end value
    None,
    Linear,
    #[default]
    Cubic,
    Quintic,
    /// Exponential ease-out
    EaseOut,
}

/// Smooth scrolling and progress observation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    /// Animate scroll offset changes
    #[serde(default = "default_true")]
    pub smooth_enabled: bool,
    /// Duration of one scroll animation in milliseconds
    #[serde(default = "default_scroll_duration")]
    pub animation_duration_ms: u64,
    #[serde(default)]
    pub easing: EasingType,
    /// Lines per j/k press when smooth scrolling is off
    #[serde(default = "default_scroll_lines")]
    pub scroll_lines: u16,
    /// Frame rate while an animation is running
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    /// Reference line as a fraction of the viewport height (0.5 = centre)
    #[serde(default = "default_reference")]
    pub reference: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            smooth_enabled: default_true(),
            animation_duration_ms: default_scroll_duration(),
            easing: EasingType::default(),
            scroll_lines: default_scroll_lines(),
            animation_fps: default_animation_fps(),
            reference: default_reference(),
        }
    }
}

/// Entrance animation settings for timeline entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    /// Delay added per entry revealed in the same pass
    #[serde(default = "default_stagger")]
    pub stagger_ms: u64,
    /// Duration of a single entry's reveal
    #[serde(default = "default_reveal_duration")]
    pub duration_ms: u64,
    /// Rows an entry rises while fading in
    #[serde(default = "default_offset_rows")]
    pub offset_rows: u16,
    #[serde(default = "default_reveal_easing")]
    pub easing: EasingType,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            stagger_ms: default_stagger(),
            duration_ms: default_reveal_duration(),
            offset_rows: default_offset_rows(),
            easing: default_reveal_easing(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    #[serde(default = "default_events")]
    pub events: Vec<TimelineEvent>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            events: default_events(),
        }
    }
}

fn default_events() -> Vec<TimelineEvent> {
    [
        (1990, "Born"),
        (1995, "Started school"),
        (2000, "Middle school"),
        (2005, "High school"),
        (2010, "College"),
        (2015, "Career start"),
        (2020, "Present day"),
    ]
    .into_iter()
    .map(|(year, description)| TimelineEvent::new(year, description))
    .collect()
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agescroll")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_tick_rate() -> u64 {
    100
}

fn default_title() -> String {
    "Age Progression Timeline".to_string()
}

fn default_theme_name() -> String {
    "gruvbox-dark".to_string()
}

fn default_true() -> bool {
    true
}

fn default_scroll_duration() -> u64 {
    150
}

fn default_scroll_lines() -> u16 {
    1
}

fn default_animation_fps() -> u32 {
    60
}

fn default_reference() -> f64 {
    0.5
}

fn default_stagger() -> u64 {
    500 // matches a 0.5s stagger between entries
}

fn default_reveal_duration() -> u64 {
    400
}

fn default_offset_rows() -> u16 {
    2
}

fn default_reveal_easing() -> EasingType {
    EasingType::EaseOut
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default path or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, defaults if it does not exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self =
                toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/agescroll/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("agescroll")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Log file used while the TUI owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("agescroll.log")
    }

    /// Photos pinned by timeline events, in timeline order
    pub fn pinned_photos(&self) -> impl Iterator<Item = &PhotoId> {
        self.timeline.events.iter().filter_map(|e| e.photo.as_ref())
    }

    fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.scroll.reference) {
            return Err(crate::Error::Config(format!(
                "scroll.reference must be within [0, 1], got {}",
                self.scroll.reference
            )));
        }
        url::Url::parse(&self.store.base_url)?;
        Ok(())
    }
}
