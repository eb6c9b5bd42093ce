mod common;

use join_board::config::{Config, PointerMode};
use std::fs;

fn write_config(content: &str) -> std::path::PathBuf {
    let dir = common::temp_dir();
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("join.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_partial_file_falls_back_to_defaults() {
    let path = write_config(
        r#"
[store]
url = "https://join-demo.europe-west1.firebasedatabase.app"

[ui]
pointer = "touch"
"#,
    );
    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.ui.pointer, PointerMode::Touch);
    assert_eq!(config.ui.long_press_ms, 500);
    assert_eq!(config.ui.stacked_below_width, 100);
    assert!(config.logging.enabled);
    assert_eq!(config.logging.level_filter(), log::LevelFilter::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_validation_errors() {
    let mut config = Config::default();
    assert!(config.validate().is_err());

    config.store.url = "ftp://example.com".to_string();
    assert!(config.validate().is_err());

    config.store.url = "https://example.com".to_string();
    config.ui.long_press_ms = 20;
    assert!(config.validate().is_err());

    config.ui.long_press_ms = 500;
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "debug".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_toml_is_reported() {
    let path = write_config("[store\nurl = ");
    assert!(Config::load_from_file(&path).is_err());
}

#[test]
fn test_session_dir_override() {
    let path = write_config(
        r#"
[store]
url = "https://example.com"

[session]
dir = "/tmp/join-session"
"#,
    );
    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(
        config.session_dir().unwrap(),
        std::path::PathBuf::from("/tmp/join-session")
    );
}
