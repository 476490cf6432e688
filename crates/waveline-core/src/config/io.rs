//! YAML configuration loading and saving
//!
//! Works with any serde type; loading never fails, saving propagates errors.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load configuration from a YAML file
///
/// A missing file yields `T::default()`. An unreadable or unparsable file is
/// logged and also yields the default, so a broken config never keeps the
/// waveform from drawing.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return T::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: failed to read {:?}: {}, using defaults", path, e);
            return T::default();
        }
    };

    match serde_yaml::from_str::<T>(&contents) {
        Ok(config) => {
            log::info!("load_config: loaded {:?}", path);
            config
        }
        Err(e) => {
            log::warn!("load_config: failed to parse {:?}: {}, using defaults", path, e);
            T::default()
        }
    }
}

/// Save configuration to a YAML file, creating parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: wrote {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisualizerConfig;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: VisualizerConfig = load_config(Path::new("/nonexistent/path/visualizer.yaml"));
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("visualizer.yaml");

        let mut config = VisualizerConfig::default();
        config.waveform.view_window_ms = 16000.0;
        config.spectrogram.rows = 128;

        save_config(&config, &path).unwrap();
        let loaded: VisualizerConfig = load_config(&path);

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_garbage_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visualizer.yaml");
        std::fs::write(&path, "waveform: [this is: not, a mapping").unwrap();

        let config: VisualizerConfig = load_config(&path);
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visualizer.yaml");
        std::fs::write(&path, "waveform:\n  playhead_ratio: 0.5\n").unwrap();

        let config: VisualizerConfig = load_config(&path);
        assert_eq!(config.waveform.playhead_ratio, 0.5);
        assert_eq!(config.waveform.fft_size, 2048);
        assert_eq!(config.spectrogram, Default::default());
    }
}
