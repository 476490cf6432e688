//! Standard locations for waveline configuration files

use std::path::PathBuf;

/// Get the default config directory
///
/// Returns: `{platform config dir}/waveline`, or `./waveline` when the
/// platform has no config dir.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waveline")
}

/// Get the default path for a config file
///
/// Returns: `{default_config_dir}/{filename}`
pub fn default_config_path(filename: &str) -> PathBuf {
    default_config_dir().join(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_waveline() {
        assert!(default_config_dir().ends_with("waveline"));
    }

    #[test]
    fn test_config_path_includes_filename() {
        let path = default_config_path("visualizer.yaml");
        assert!(path.ends_with("waveline/visualizer.yaml"));
    }
}
