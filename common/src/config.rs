use serde::Deserialize;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub outline: OutlineConfig,
    #[serde(default)]
    pub silhouette: SilhouetteConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_mode")]
    pub mode: String,
    #[serde(default = "default_replay_path")]
    pub replay_path: String,
    /// Empty disables recording.
    #[serde(default)]
    pub record_path: String,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutlineConfig {
    /// Keep every `stride`-th traced boundary pixel.
    #[serde(default = "default_stride")]
    pub stride: usize,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_include_depth")]
    pub include_depth: bool,
    /// 0 follows the first tracked subject.
    #[serde(default)]
    pub target_player: u8,
    #[serde(default)]
    pub use_skeleton_roi: bool,
    #[serde(default = "default_roi_padding")]
    pub roi_padding: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SilhouetteConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            mode: default_sensor_mode(),
            replay_path: default_replay_path(),
            record_path: String::new(),
            fps: default_fps(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            stride: default_stride(),
            max_points: default_max_points(),
            include_depth: default_include_depth(),
            target_player: 0,
            use_skeleton_roi: false,
            roi_padding: default_roi_padding(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            command: default_client_command(),
            args: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl OutlineConfig {
    /// The configured target player, if one overrides the tracked subject.
    pub fn target_override(&self) -> Option<u8> {
        (self.target_player > 0).then_some(self.target_player)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Load `path` if given. Without a path, `config.toml` in the working
    /// directory is used when it exists and built-in defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outline.stride == 0 {
            return Err(ConfigError::Invalid("outline.stride must be at least 1".into()));
        }
        if self.outline.max_points == 0 {
            return Err(ConfigError::Invalid(
                "outline.max_points must be at least 1".into(),
            ));
        }
        if self.outline.target_player > 7 {
            return Err(ConfigError::Invalid(format!(
                "outline.target_player {} is outside the 3-bit player index range",
                self.outline.target_player
            )));
        }
        if !(self.sensor.fps > 0.0) {
            return Err(ConfigError::Invalid("sensor.fps must be positive".into()));
        }
        if self.sensor.width == 0 || self.sensor.height == 0 {
            return Err(ConfigError::Invalid(
                "sensor.width and sensor.height must be non-zero".into(),
            ));
        }
        if self.sensor.width > u16::MAX as usize || self.sensor.height > u16::MAX as usize {
            return Err(ConfigError::Invalid(
                "sensor dimensions must fit in 16 bits".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_sensor_mode() -> String {
    "synthetic".into()
}
fn default_replay_path() -> String {
    "capture.bin".into()
}
fn default_fps() -> f64 {
    30.0
}
fn default_width() -> usize {
    640
}
fn default_height() -> usize {
    480
}
fn default_stride() -> usize {
    3
}
fn default_max_points() -> usize {
    320
}
fn default_include_depth() -> bool {
    true
}
fn default_roi_padding() -> usize {
    20
}
fn default_client_command() -> String {
    "silhouette-bridge".into()
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_compiled_in_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.outline.stride, 3);
        assert_eq!(config.outline.max_points, 320);
        assert_eq!(config.outline.roi_padding, 20);
        assert!(config.outline.include_depth);
        assert!(config.outline.target_override().is_none());
        assert_eq!(config.sensor.mode, "synthetic");
        assert_eq!((config.sensor.width, config.sensor.height), (640, 480));
        assert!(!config.silhouette.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [outline]
            max_points = 64
            target_player = 2

            [sensor]
            mode = "replay"
            replay_path = "session.bin"
            "#,
        )
        .unwrap();
        assert_eq!(config.outline.max_points, 64);
        assert_eq!(config.outline.stride, 3);
        assert_eq!(config.outline.target_override(), Some(2));
        assert_eq!(config.sensor.mode, "replay");
        assert_eq!(config.sensor.replay_path, "session.bin");
        assert_eq!(config.sensor.fps, 30.0);
    }

    #[test]
    fn zero_stride_rejected() {
        let err = Config::parse("[outline]\nstride = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_cap_rejected() {
        let err = Config::parse("[outline]\nmax_points = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn out_of_range_player_rejected() {
        let err = Config::parse("[outline]\ntarget_player = 8\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = Config::parse("[outline\nstride = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_explicit_file_is_read_error() {
        let err = Config::load_or_default(Some(Path::new("/nonexistent/bridge.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile(..)));
    }
}
