//! Configuration loading
//!
//! The engine is configured from a single TOML file. Every field has a
//! built-in default, so a missing file yields a runnable configuration with
//! the four stock stations.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`ONAIR_CONFIG`)
//! 3. `<user config dir>/onair/config.toml`
//! 4. Built-in defaults

use crate::fade_curves::FadeCurve;
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ONAIR_CONFIG";

/// Engine configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP control API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Folder that asset identifiers and relative paths are resolved against
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Seed for every station's random source (entropy when absent)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Station audible at startup (first station when absent)
    #[serde(default)]
    pub active_station: Option<String>,

    /// Station whose music gets ranked crossfades and whose ids count as
    /// short ids (first `home` preset station when absent)
    #[serde(default)]
    pub home_station: Option<String>,

    /// Fade metadata JSON (optional)
    #[serde(default)]
    pub metadata_file: Option<PathBuf>,

    /// Narration duration JSON files, merged in order
    #[serde(default)]
    pub duration_files: Vec<PathBuf>,

    /// News calendar JSON (optional)
    #[serde(default)]
    pub news_calendar_file: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub ducking: DuckingConfig,

    #[serde(default)]
    pub switching: SwitchConfig,

    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default = "default_stations")]
    pub stations: Vec<StationConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Station runner timing
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Lead added to "now" when a station's timeline is (re)started
    #[serde(default = "default_start_lead_secs")]
    pub start_lead_secs: f64,

    /// How long before the projected end of the timeline the next job is due
    #[serde(default = "default_wake_lead_secs")]
    pub wake_lead_secs: f64,

    /// Delay before the emergency re-compose when a loaded job is unusable
    #[serde(default = "default_fallback_delay_ms")]
    pub fallback_delay_ms: u64,

    /// Backoff after a failed iteration
    #[serde(default = "default_failure_backoff_ms")]
    pub failure_backoff_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            start_lead_secs: default_start_lead_secs(),
            wake_lead_secs: default_wake_lead_secs(),
            fallback_delay_ms: default_fallback_delay_ms(),
            failure_backoff_ms: default_failure_backoff_ms(),
        }
    }
}

/// Music ducking under narration
#[derive(Debug, Clone, Deserialize)]
pub struct DuckingConfig {
    #[serde(default = "default_duck_ramp_secs")]
    pub ramp_down_secs: f64,

    #[serde(default = "default_duck_ramp_secs")]
    pub ramp_up_secs: f64,

    /// Guard delay between the last narration ending and the release ramp
    #[serde(default = "default_release_guard_ms")]
    pub release_guard_ms: u64,

    /// How far ahead of a narration's start the duck begins
    #[serde(default = "default_duck_lead_secs")]
    pub lead_secs: f64,

    #[serde(default)]
    pub curve: FadeCurve,
}

impl Default for DuckingConfig {
    fn default() -> Self {
        Self {
            ramp_down_secs: default_duck_ramp_secs(),
            ramp_up_secs: default_duck_ramp_secs(),
            release_guard_ms: default_release_guard_ms(),
            lead_secs: default_duck_lead_secs(),
            curve: FadeCurve::Linear,
        }
    }
}

/// Master gain moves when the audible station changes
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchConfig {
    #[serde(default = "default_switch_fade_out_secs")]
    pub fade_out_secs: f64,

    #[serde(default = "default_switch_fade_in_secs")]
    pub fade_in_secs: f64,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            fade_out_secs: default_switch_fade_out_secs(),
            fade_in_secs: default_switch_fade_in_secs(),
        }
    }
}

/// Substring markers used to classify asset identifiers
#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default = "default_ad_jingle_markers")]
    pub ad_jingle_markers: Vec<String>,

    #[serde(default = "default_long_id_markers")]
    pub long_id_markers: Vec<String>,

    #[serde(default = "default_id_marker")]
    pub id_marker: String,

    #[serde(default = "default_news_marker")]
    pub news_marker: String,

    #[serde(default = "default_ad_marker")]
    pub ad_marker: String,

    #[serde(default = "default_music_marker")]
    pub music_marker: String,

    #[serde(default = "default_solo_marker")]
    pub solo_marker: String,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            ad_jingle_markers: default_ad_jingle_markers(),
            long_id_markers: default_long_id_markers(),
            id_marker: default_id_marker(),
            news_marker: default_news_marker(),
            ad_marker: default_ad_marker(),
            music_marker: default_music_marker(),
            solo_marker: default_solo_marker(),
        }
    }
}

/// Policy preset a station is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationPreset {
    /// Music/ids/ads/news rotation with follow-up overrides
    #[default]
    Standard,
    /// Jingles and long/short station ids, ranked music crossfades
    Home,
}

/// One station entry (`[[stations]]`)
#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub id: String,
    pub name: String,
    /// Folder prefix of this station's assets (also its classification marker)
    pub base_path: String,
    /// Catalog JSON; defaults to `<base_path>/catalog.json`
    #[serde(default)]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub preset: StationPreset,
    #[serde(default)]
    pub duck_target: Option<f32>,
    #[serde(default)]
    pub narration_acceptance: Option<f64>,
    /// Cover shown when the current track is unknown; defaults to
    /// `<base_path>/capas/default.jpg`
    #[serde(default)]
    pub default_cover_art: Option<String>,
    /// Weighted template table replacing the preset's, e.g.
    /// `templates = [["solo+music", 4], ["music", 2]]`
    #[serde(default)]
    pub templates: Option<Vec<(String, u32)>>,
    /// Follow-up hint → template, replacing the preset's overrides
    #[serde(default)]
    pub followup_overrides: Option<HashMap<String, String>>,
}

impl StationConfig {
    pub fn new(id: &str, name: &str, base_path: &str, preset: StationPreset) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_path: base_path.to_string(),
            catalog: None,
            preset,
            duck_target: None,
            narration_acceptance: None,
            default_cover_art: None,
            templates: None,
            followup_overrides: None,
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.base_path).join("catalog.json"))
    }

    pub fn default_cover_art(&self) -> String {
        self.default_cover_art
            .clone()
            .unwrap_or_else(|| format!("{}/capas/default.jpg", self.base_path))
    }
}

fn default_port() -> u16 {
    5790
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_start_lead_secs() -> f64 {
    0.1
}

fn default_wake_lead_secs() -> f64 {
    4.0
}

fn default_fallback_delay_ms() -> u64 {
    500
}

fn default_failure_backoff_ms() -> u64 {
    5000
}

fn default_duck_ramp_secs() -> f64 {
    0.2
}

fn default_release_guard_ms() -> u64 {
    10
}

fn default_duck_lead_secs() -> f64 {
    0.05
}

fn default_switch_fade_out_secs() -> f64 {
    0.2
}

fn default_switch_fade_in_secs() -> f64 {
    1.0
}

fn default_ad_jingle_markers() -> Vec<String> {
    vec!["KULT_AD".to_string()]
}

fn default_long_id_markers() -> Vec<String> {
    (30..=36).map(|n| format!("ID_{}", n)).collect()
}

fn default_id_marker() -> String {
    "ID_".to_string()
}

fn default_news_marker() -> String {
    "/news/".to_string()
}

fn default_ad_marker() -> String {
    "/adv/".to_string()
}

fn default_music_marker() -> String {
    "/musicas/".to_string()
}

fn default_solo_marker() -> String {
    "MONO_SOLO_".to_string()
}

fn default_stations() -> Vec<StationConfig> {
    vec![
        StationConfig::new("rock", "Vinewood Boulevard Radio", "RADIO_18_90S_ROCK", StationPreset::Standard),
        StationConfig::new("silverlake", "Radio Mirror Park", "RADIO_16_SILVERLAKE", StationPreset::Standard),
        StationConfig::new("class_rock", "Los Santos Rock Radio", "RADIO_01_CLASS_ROCK", StationPreset::Standard),
        StationConfig::new("kult", "Kult FM 99.1", "RADIO_34_DLC_HEI4_KULT", StationPreset::Home),
    ]
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            root_folder: None,
            seed: None,
            active_station: None,
            home_station: None,
            metadata_file: None,
            duration_files: Vec::new(),
            news_calendar_file: None,
            logging: LoggingConfig::default(),
            runner: RunnerConfig::default(),
            ducking: DuckingConfig::default(),
            switching: SwitchConfig::default(),
            classification: ClassificationConfig::default(),
            stations: default_stations(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the config from the first available source, or fall back to defaults
    ///
    /// An explicitly named file (CLI or environment) that fails to load is an
    /// error; a missing default-location file is not.
    pub fn load_with_priority(cli_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_path {
            info!("Loading config from {}", path.display());
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            info!("Loading config from {} (via {})", path, CONFIG_ENV_VAR);
            return Self::load(Path::new(&path));
        }

        if let Some(path) = default_config_path() {
            if path.exists() {
                info!("Loading config from {}", path.display());
                return Self::load(&path);
            }
        }

        warn!("No config file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<()> {
        if self.stations.is_empty() {
            return Err(Error::Config("at least one station is required".to_string()));
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.id.is_empty() {
                return Err(Error::Config("station id must not be empty".to_string()));
            }
            if !seen.insert(station.id.as_str()) {
                return Err(Error::Config(format!("duplicate station id '{}'", station.id)));
            }
            if let Some(target) = station.duck_target {
                if !(0.0..=1.0).contains(&target) {
                    return Err(Error::Config(format!(
                        "station '{}': duck_target {} outside 0.0-1.0",
                        station.id, target
                    )));
                }
            }
            if let Some(p) = station.narration_acceptance {
                if !(0.0..=1.0).contains(&p) {
                    return Err(Error::Config(format!(
                        "station '{}': narration_acceptance {} outside 0.0-1.0",
                        station.id, p
                    )));
                }
            }
            if let Some(templates) = &station.templates {
                if templates.iter().all(|(_, w)| *w == 0) {
                    return Err(Error::Config(format!(
                        "station '{}': template table has no positive weight",
                        station.id
                    )));
                }
            }
        }

        for (label, id) in [
            ("active_station", &self.active_station),
            ("home_station", &self.home_station),
        ] {
            if let Some(id) = id {
                if !seen.contains(id.as_str()) {
                    return Err(Error::Config(format!("{} '{}' is not a configured station", label, id)));
                }
            }
        }

        if self.runner.wake_lead_secs < 0.0 || self.runner.start_lead_secs < 0.0 {
            return Err(Error::Config("runner leads must be non-negative".to_string()));
        }

        Ok(())
    }

    /// Root folder, defaulting to the platform data directory
    pub fn root_folder(&self) -> PathBuf {
        self.root_folder.clone().unwrap_or_else(default_root_folder)
    }

    /// Resolve a possibly relative path against the root folder
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_folder().join(path)
        }
    }

    /// Station that starts audible
    pub fn active_station_id(&self) -> Option<&str> {
        self.active_station
            .as_deref()
            .or_else(|| self.stations.first().map(|s| s.id.as_str()))
    }

    /// Station treated as the home station for classification
    pub fn home_station_config(&self) -> Option<&StationConfig> {
        match &self.home_station {
            Some(id) => self.stations.iter().find(|s| &s.id == id),
            None => self.stations.iter().find(|s| s.preset == StationPreset::Home),
        }
    }
}

/// `<user config dir>/onair/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("onair").join("config.toml"))
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("onair"))
        .unwrap_or_else(|| PathBuf::from("./onair_data"))
}
