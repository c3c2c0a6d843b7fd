use std::{fs, path::PathBuf, thread::sleep, time::Duration};

use once_cell::sync::Lazy;
use serial_test::serial;
use tempfile::{tempdir, TempDir};

// The subscriber is process wide, so every test logs to the same file.
static LOG_DIR: Lazy<TempDir> = Lazy::new(|| tempdir().unwrap());

fn log_path() -> PathBuf {
    LOG_DIR.path().join("signs.log")
}

fn read_log() -> String {
    sleep(Duration::from_millis(100));
    fs::read_to_string(log_path()).unwrap_or_default()
}

#[test]
#[serial]
fn writes_log_file() {
    sign_coder::logging::init(true, Some(log_path()));
    tracing::info!(sign = "巳", "sign confirmed");

    assert!(log_path().exists(), "log file was not created");
    assert!(read_log().contains("sign confirmed"));
}

#[test]
#[serial]
fn repeated_init_keeps_the_file_sink() {
    sign_coder::logging::init(true, Some(log_path()));
    sign_coder::logging::init(false, None);
    tracing::info!("still writing to the file");

    assert!(read_log().contains("still writing to the file"));
}

#[test]
#[serial]
fn dry_run_actions_are_logged() {
    use sign_coder::signs::pipeline::{DryRunInjector, KeyInjector};

    sign_coder::logging::init(true, Some(log_path()));
    DryRunInjector.emit_text("hello").unwrap();
    DryRunInjector
        .press_chord(&["ctrl".to_string(), "enter".to_string()])
        .unwrap();

    let log = read_log();
    assert!(log.contains("dry run: emit text"));
    assert!(log.contains("ctrl+enter"));
}
