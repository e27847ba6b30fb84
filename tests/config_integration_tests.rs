//! Integration tests for ConfigManager and configuration file handling
//!
//! These tests verify:
//! - Configuration loading and saving
//! - Default configuration when the file is missing or partial
//! - Environment overrides on top of the file
//! - Wiring of the loaded settings into the backend client
//!
//! Only `test_environment_overrides_file` sets an environment variable, and no
//! other test in this binary asserts the key it overrides.

use camino::Utf8PathBuf;
use std::fs;
use tempfile::TempDir;
use trafficdash::ConfigManager;
use trafficdash::config::CONFIG_FILE_NAME;
use trafficdash::models::DashboardConfig;
use trafficdash::services::HttpTrafficApi;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    assert_eq!(manager.config_dir(), config_path.as_path());
    assert_eq!(manager.config_path(), config_path.join(CONFIG_FILE_NAME).as_path());
}

#[test]
fn test_creates_missing_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let nested = config_path.join("TrafficDash Data");
    assert!(!nested.exists());

    ConfigManager::new(&nested).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_load_default_config() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let config = manager.load_config().unwrap();

    assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
    assert_eq!(config.backend.request_timeout_secs, 60);
    assert_eq!(config.animation.first_progress_delay_ms, 800);
    assert_eq!(config.animation.second_progress_delay_ms, 1800);
    assert_eq!(config.animation.fade_in_delay_ms, 300);
    assert_eq!(config.animation.simulation_start_delay_ms, 500);
    assert!(!config.logging.debug_mode);
}

#[test]
fn test_save_and_reload() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    let mut config = DashboardConfig::default();
    config.backend.base_url = "http://10.0.0.7:5000".to_string();
    config.backend.request_timeout_secs = 15;
    config.logging.debug_mode = true;
    config.logging.console_output = false;
    manager.save_config(&config).unwrap();

    assert!(manager.config_path().exists());
    let content = fs::read_to_string(manager.config_path()).unwrap();
    assert!(content.contains("10.0.0.7:5000"));

    let reloaded = ConfigManager::new(&config_path).unwrap().load_config().unwrap();
    assert_eq!(reloaded.backend, config.backend);
    assert_eq!(reloaded.logging, config.logging);
}

#[test]
fn test_hand_written_partial_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(
        manager.config_path(),
        r#"
backend:
  base_url: "http://traffic.example:8000/dashboard"
animation:
  fade_in_delay_ms: 0
"#,
    )
    .unwrap();

    let config = manager.load_config().unwrap();
    assert_eq!(config.backend.base_url, "http://traffic.example:8000/dashboard");
    assert_eq!(config.backend.request_timeout_secs, 60);
    assert_eq!(config.animation.fade_in_delay_ms, 0);
    assert_eq!(config.animation.dot_pulse_interval_ms, 400);
    assert_eq!(config.logging.log_dir, "logs");
}

#[test]
fn test_environment_overrides_file() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.config_path(), "animation:\n  light_tick_ms: 250\n").unwrap();

    // SAFETY: no other test in this binary reads or writes this variable
    unsafe {
        std::env::set_var("TRAFFICDASH__ANIMATION__LIGHT_TICK_MS", "40");
    }
    let config = manager.load_config();
    unsafe {
        std::env::remove_var("TRAFFICDASH__ANIMATION__LIGHT_TICK_MS");
    }

    assert_eq!(config.unwrap().animation.light_tick_ms, 40);
}

#[test]
fn test_invalid_yaml_reports_error() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();

    fs::write(manager.config_path(), "backend:\n  base_url: [\n").unwrap();

    let err = manager.load_config().unwrap_err();
    assert!(format!("{:#}", err).contains(CONFIG_FILE_NAME));
}

#[test]
fn test_loaded_backend_settings_build_client() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.config_path(), "backend:\n  base_url: http://127.0.0.1:9000/traffic\n").unwrap();

    let config = manager.load_config().unwrap();
    let api = HttpTrafficApi::new(&config.backend).unwrap();
    assert_eq!(api.base_url().as_str(), "http://127.0.0.1:9000/traffic");
}

#[test]
fn test_unusable_backend_url_is_rejected() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = ConfigManager::new(&config_path).unwrap();
    fs::write(manager.config_path(), "backend:\n  base_url: \"mailto:ops@example.com\"\n").unwrap();

    let config = manager.load_config().unwrap();
    assert!(HttpTrafficApi::new(&config.backend).is_err());
}
