use phase_routines::util::config::{load_config, save_config, ConfigError, RoutinesConfig};
use phase_routines::util::logger::{self, LogLevel};
use phase_routines::{
    wait_for_seconds, CancelToken, FrameClock, FrameDriver, PauseToken, RoutineRunner, SharedClock,
    TimeSource,
};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_clock_and_driver_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("routines.toml");
    fs::write(
        &path,
        r#"
[clock]
time_scale = 2.0
max_delta_ms = 50

[driver]
cadence_hz = 20

[log]
level = "warn"
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.log.level, LogLevel::Warn);

    let clock = FrameClock::from_config(&config.clock);
    assert_eq!(clock.time_scale(), 2.0);
    assert_eq!(clock.max_delta(), Duration::from_millis(50));

    // Oversized frames are clamped before scaling.
    clock.advance(Duration::from_millis(200));
    assert_eq!(clock.realtime(), Duration::from_millis(50));
    assert_eq!(clock.time(), Duration::from_millis(100));

    let cadence = FrameDriver::cadence_from_config(&config.driver).unwrap();
    assert_eq!(cadence, Duration::from_millis(50));
}

#[test]
fn test_configured_driver_runs_timer() {
    let mut config = RoutinesConfig::default();
    config.clock.time_scale = 4.0;
    config.driver.cadence_hz = 50;

    let runner = Arc::new(RoutineRunner::new());
    let frame_clock = Arc::new(FrameClock::from_config(&config.clock));
    let clock: SharedClock = frame_clock.clone();
    let cadence = FrameDriver::cadence_from_config(&config.driver).unwrap();
    let mut driver = FrameDriver::new(runner.clone(), frame_clock);

    let awaiter = runner.run_routine(
        wait_for_seconds(Duration::from_secs(2), &clock, &CancelToken::none()),
        PauseToken::none(),
    );
    // 80ms of scaled time per 20ms frame.
    driver.step_many(25, cadence);
    assert!(!awaiter.is_completed());
    driver.step(cadence);
    assert!(awaiter.is_completed());
}

#[test]
fn test_save_then_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("routines.toml");
    let mut config = RoutinesConfig::default();
    config.driver.cadence_hz = 120;

    save_config(&path, &config).unwrap();
    assert_eq!(load_config(&path).unwrap(), config);
}

#[test]
fn test_invalid_file_reports_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[clock]\ntime_scale = \"fast\"\n").unwrap();

    assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
}

#[test]
fn test_logger_init_is_idempotent() {
    logger::init_with_level(LogLevel::Warn);
    logger::init();
    logger::init_debug();
    tracing::info!("logger installed");
}
