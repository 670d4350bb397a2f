//! Settings file loading (`testkit.toml` by default).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::settings::Settings;

pub const DEFAULT_SETTINGS_PATH: &str = "testkit.toml";

/// Load settings from a TOML file.
///
/// If the file is missing, returns `Settings::default()`.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "settings file missing, using defaults");
        let settings = Settings::default();
        settings.validate()?;
        return Ok(settings);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let settings: Settings =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let settings = load_settings(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("testkit.toml");
        fs::write(
            &path,
            "driver_repo = \"/work/driver\"\n\n[backend]\nreadiness_address = \"127.0.0.1:9876\"\n",
        )
        .expect("write");

        let settings = load_settings(&path).expect("load");
        assert_eq!(settings.driver_repo, PathBuf::from("/work/driver"));
        assert_eq!(settings.backend.readiness_address, "127.0.0.1:9876");
        assert_eq!(settings.backend.readiness_timeout_secs, 30);
        assert_eq!(settings.browser, Settings::default().browser);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("testkit.toml");
        fs::write(&path, "[backend]\nreadiness_interval_ms = 0\n").expect("write");

        let err = load_settings(&path).unwrap_err();
        assert!(format!("{err:#}").contains("readiness_interval_ms"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("testkit.toml");
        fs::write(&path, "driver_repo = [").expect("write");

        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
