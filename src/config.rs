use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisConfig,
    pub jobs: JobsConfig,
}

/// Analysis tuning knobs shared by the metric scorers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Recordings shorter than this make duration-dependent scorers abstain.
    pub min_duration_sec: f64,
    /// Silence touching the recording boundary within this margin is dropped.
    pub boundary_margin_sec: f64,
    /// Minimum overlap for two pause intervals to count as the same pause.
    pub merge_tolerance_sec: f64,
    /// Default language tag for transcripts.
    pub language: String,
}

/// Job manager configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
    pub id_prefix: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_duration_sec: defaults::MIN_ANALYSIS_DURATION_SEC,
            boundary_margin_sec: defaults::PAUSE_BOUNDARY_MARGIN_SEC,
            merge_tolerance_sec: defaults::PAUSE_MERGE_TOLERANCE_SEC,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            id_prefix: defaults::JOB_ID_PREFIX.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Self::default()
                } else {
                    panic!("Failed to load config from {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PODIUM_LANGUAGE → analysis.language
    /// - PODIUM_MIN_DURATION_SEC → analysis.min_duration_sec
    /// - PODIUM_JOB_PREFIX → jobs.id_prefix
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("PODIUM_LANGUAGE")
            && !language.is_empty()
        {
            self.analysis.language = language;
        }

        if let Ok(min_duration) = std::env::var("PODIUM_MIN_DURATION_SEC")
            && let Ok(value) = min_duration.parse::<f64>()
            && value >= 0.0
        {
            self.analysis.min_duration_sec = value;
        }

        if let Ok(prefix) = std::env::var("PODIUM_JOB_PREFIX")
            && !prefix.is_empty()
        {
            self.jobs.id_prefix = prefix;
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/podium/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("podium")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_podium_env() {
        remove_env("PODIUM_LANGUAGE");
        remove_env("PODIUM_MIN_DURATION_SEC");
        remove_env("PODIUM_JOB_PREFIX");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.analysis.min_duration_sec, 3.0);
        assert_eq!(config.analysis.boundary_margin_sec, 0.3);
        assert_eq!(config.analysis.merge_tolerance_sec, 0.1);
        assert_eq!(config.analysis.language, "en");
        assert_eq!(config.jobs.id_prefix, "talk");
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [analysis]
            min_duration_sec = 5.0
            boundary_margin_sec = 0.5
            merge_tolerance_sec = 0.2
            language = "de"

            [jobs]
            id_prefix = "pres"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.analysis.min_duration_sec, 5.0);
        assert_eq!(config.analysis.boundary_margin_sec, 0.5);
        assert_eq!(config.analysis.merge_tolerance_sec, 0.2);
        assert_eq!(config.analysis.language, "de");
        assert_eq!(config.jobs.id_prefix, "pres");
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [analysis]
            language = "fr"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.analysis.language, "fr");
        assert_eq!(config.analysis.min_duration_sec, 3.0);
        assert_eq!(config.jobs.id_prefix, "talk");
    }

    #[test]
    fn test_env_override_language() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_podium_env();

        set_env("PODIUM_LANGUAGE", "es");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.analysis.language, "es");
        assert_eq!(config.jobs.id_prefix, "talk"); // Not overridden

        clear_podium_env();
    }

    #[test]
    fn test_env_override_min_duration() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_podium_env();

        set_env("PODIUM_MIN_DURATION_SEC", "7.5");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.analysis.min_duration_sec, 7.5);

        clear_podium_env();
    }

    #[test]
    fn test_env_override_rejects_garbage_duration() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_podium_env();

        set_env("PODIUM_MIN_DURATION_SEC", "not-a-number");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.analysis.min_duration_sec, 3.0);

        clear_podium_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_podium_env();

        set_env("PODIUM_LANGUAGE", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.analysis.language, "en");

        clear_podium_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [analysis
            language = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("podium"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_podium_config_12345.toml");
        let config = Config::load_or_default(missing_path);

        assert_eq!(config, Config::default());
    }

    #[test]
    #[should_panic(expected = "Failed to load config")]
    fn test_load_or_default_panics_on_invalid_toml() {
        let invalid_toml = r#"
            [analysis
            language = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        Config::load_or_default(temp_file.path());
    }
}
