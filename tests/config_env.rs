//! Environment overrides of the runtime configuration

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use spicetools::config::{CONFIG_ENV, HTTP_TIMEOUT_ENV, KERNEL_DIR_ENV};
use spicetools::Config;

/// Serializes tests that touch the process environment
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [CONFIG_ENV, KERNEL_DIR_ENV, HTTP_TIMEOUT_ENV] {
        std::env::remove_var(key);
    }
}

#[test]
fn test_no_overrides_keeps_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    assert_eq!(Config::load().unwrap(), Config::default());
}

#[test]
fn test_kernel_dir_and_timeout_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    std::env::set_var(KERNEL_DIR_ENV, "/srv/naif");
    std::env::set_var(HTTP_TIMEOUT_ENV, " 42 ");
    let config = Config::load().unwrap();
    clear_env();

    assert_eq!(config.kernel_dir, PathBuf::from("/srv/naif"));
    assert_eq!(config.http_timeout_secs, 42);
    assert_eq!(config.sbdb_url, Config::default().sbdb_url);
}

#[test]
fn test_invalid_timeout_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    for raw in ["soon", "-5", "1.5", ""] {
        std::env::set_var(HTTP_TIMEOUT_ENV, raw);
        let config = Config::load().unwrap();
        assert_eq!(config.http_timeout_secs, Config::default().http_timeout_secs, "{:?}", raw);
    }
    clear_env();
}

#[test]
fn test_env_overrides_win_over_config_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"kernel_dir": "/from/file", "http_timeout_secs": 7}}"#).unwrap();

    std::env::set_var(CONFIG_ENV, file.path());
    let from_file = Config::load().unwrap();
    std::env::set_var(KERNEL_DIR_ENV, "/from/env");
    let overridden = Config::load().unwrap();
    clear_env();

    assert_eq!(from_file.kernel_dir, PathBuf::from("/from/file"));
    assert_eq!(from_file.http_timeout_secs, 7);
    assert_eq!(overridden.kernel_dir, PathBuf::from("/from/env"));
    assert_eq!(overridden.http_timeout_secs, 7);
}
