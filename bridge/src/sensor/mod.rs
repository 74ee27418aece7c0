pub mod mapper;
pub mod record;
pub mod replay;
pub mod synthetic;

use silhouette_bridge_common::capture::{CaptureError, CaptureRecord};
use silhouette_bridge_common::config::SensorConfig;
use tracing::info;

/// A depth sensor source. Everything device-specific lives behind this
/// trait; the outline pipeline only ever sees [`CaptureRecord`]s.
pub trait Sensor: Send {
    fn name(&self) -> &str;

    /// Frame dimensions this sensor produces.
    fn dimensions(&self) -> (usize, usize);

    /// Next tick, or `None` once the source is exhausted.
    fn next_record(&mut self) -> Result<Option<CaptureRecord>, SensorError>;
}

/// Open the sensor selected by `config.mode`. An error here means no
/// compatible device is available.
pub fn open(config: &SensorConfig) -> Result<Box<dyn Sensor>, SensorError> {
    let sensor: Box<dyn Sensor> = match config.mode.as_str() {
        "synthetic" => Box::new(synthetic::SyntheticSensor::new(config.width, config.height)),
        "replay" => Box::new(replay::ReplaySensor::open(&config.replay_path)?),
        other => return Err(SensorError::UnknownMode(other.to_string())),
    };
    let (width, height) = sensor.dimensions();
    info!(sensor = sensor.name(), width, height, "sensor opened");
    Ok(sensor)
}

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("unknown sensor mode {0:?}, expected 'synthetic' or 'replay'")]
    UnknownMode(String),
    #[error("failed to open capture {0}: {1}")]
    Open(String, std::io::Error),
    #[error("capture {0} contains no records")]
    Empty(String),
    #[error("capture stream error: {0}")]
    Capture(#[from] CaptureError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_is_rejected() {
        let config = SensorConfig {
            mode: "kinect-v9".into(),
            ..SensorConfig::default()
        };
        assert!(matches!(open(&config), Err(SensorError::UnknownMode(_))));
    }

    #[test]
    fn missing_capture_means_no_device() {
        let config = SensorConfig {
            mode: "replay".into(),
            replay_path: "/nonexistent/capture.bin".into(),
            ..SensorConfig::default()
        };
        assert!(matches!(open(&config), Err(SensorError::Open(..))));
    }

    #[test]
    fn synthetic_uses_configured_size() {
        let config = SensorConfig {
            width: 320,
            height: 240,
            ..SensorConfig::default()
        };
        let sensor = open(&config).unwrap();
        assert_eq!(sensor.dimensions(), (320, 240));
    }
}
