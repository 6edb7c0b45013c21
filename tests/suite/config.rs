//! Config file to engine settings.

use std::io::Write;
use std::time::Duration;

use aether_config::AetherConfig;
use aether_engine::EngineSettings;

#[test]
fn config_file_drives_engine_settings() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[surface]\nmerge_threshold = 90.0\nreject_offset = 10.0\n\n\
         [oracle]\ntimeout_secs = 12\n\n\
         [notifications]\ndiscovery_secs = 1\n"
    )
    .unwrap();

    let config = AetherConfig::load_from(file.path()).unwrap();
    let settings = EngineSettings::from_config(config.as_ref());

    assert!((settings.merge_threshold - 90.0).abs() < f64::EPSILON);
    assert!((settings.reject_offset - 10.0).abs() < f64::EPSILON);
    assert_eq!(settings.oracle_timeout, Some(Duration::from_secs(12)));
    assert_eq!(settings.discovery_duration, Duration::from_secs(1));
}

#[test]
fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AetherConfig::load_from(&dir.path().join("config.toml")).unwrap();
    assert!(config.is_none());
    assert_eq!(
        EngineSettings::from_config(config.as_ref()),
        EngineSettings::default()
    );
}
