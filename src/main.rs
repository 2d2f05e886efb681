//! Phase Routines - frame loop simulator

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use phase_routines::util::config::{load_config_or_default, RoutinesConfig};
use phase_routines::util::logger::{self, LogLevel};
use phase_routines::{
    from_fn, wait_for_fixed_update, wait_for_seconds, wait_for_update, wait_until, CancelToken,
    FrameClock, FrameDriver, PauseToken, PauseTokenSource, Phase, Routine, RoutineRunner,
    Sequence, SharedClock, Step, TimeSource, NAME, VERSION,
};

/// Drive a set of demo routines through a simulated frame loop
#[derive(Parser, Debug)]
#[command(name = "routine-sim")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 180)]
    frames: u64,

    /// Override the configured time scale
    #[arg(short, long)]
    time_scale: Option<f64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config_or_default(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => RoutinesConfig::default(),
    };
    if let Some(scale) = args.time_scale {
        config.clock.time_scale = scale;
    }
    config.validate().context("Invalid configuration")?;

    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config.log.level
    };
    logger::init_with_level(level);

    if args.verbose {
        eprintln!("{} version: {}", NAME, VERSION);
    }

    let runner = Arc::new(RoutineRunner::new());
    let clock = Arc::new(FrameClock::from_config(&config.clock));
    let cadence = FrameDriver::cadence_from_config(&config.driver).context("Invalid cadence")?;
    let mut driver = FrameDriver::new(runner.clone(), clock);

    let group = PauseTokenSource::new();
    spawn_demo(&runner, &driver.shared_clock(), &group);

    let pause_at = args.frames / 2;
    let resume_at = args.frames * 3 / 4;
    for frame in 0..args.frames {
        if frame == pause_at {
            info!(frame, "pausing group");
            group.pause();
        } else if frame == resume_at {
            info!(frame, "resuming group");
            group.resume();
        }
        driver.step(cadence);
    }

    let stats = runner.stats().snapshot();
    println!("frames:     {}", driver.cycles());
    println!("time:       {:?}", driver.clock().time());
    println!("submitted:  {}", stats.submitted);
    println!("completed:  {}", stats.completed);
    println!("resumed:    {}", stats.resumed);
    println!("migrated:   {}", stats.migrated);
    println!("still live: {}", runner.len());

    Ok(())
}

fn spawn_demo(
    runner: &RoutineRunner,
    clock: &SharedClock,
    group: &PauseTokenSource,
) {
    let none = CancelToken::none();

    // Timer
    let timer_clock = clock.clone();
    runner
        .run(
            Sequence::new()
                .then(|| info!("timer started"))
                .wait(move || {
                    wait_for_seconds(Duration::from_secs(1), &timer_clock, &CancelToken::none())
                })
                .then(|| info!("timer fired")),
            PauseToken::none(),
        )
        .on_complete(|| info!("timer routine complete"));

    // Frame counter plus a predicate wait on it
    let frames = Arc::new(AtomicU64::new(0));
    let counter = frames.clone();
    runner.run(
        from_fn(move || -> Step {
            counter.fetch_add(1, Ordering::SeqCst);
            Step::Yielded(wait_for_update())
        }),
        PauseToken::none(),
    );
    let watched = frames.clone();
    runner
        .run_routine(
            wait_until(move || watched.load(Ordering::SeqCst) >= 30, &none),
            PauseToken::none(),
        )
        .on_complete(|| info!("30 frames counted"));

    // Nested chain
    let leaf = || {
        Sequence::new()
            .wait(wait_for_fixed_update)
            .wait(wait_for_fixed_update)
            .then(|| info!("leaf done"))
    };
    let branch = move || {
        Sequence::new()
            .wait(move || Routine::new(Phase::Update, leaf))
            .then(|| info!("branch done"))
    };
    runner.run_then(
        Sequence::new()
            .wait(move || Routine::new(Phase::Update, branch))
            .then(|| info!("root done")),
        PauseToken::none(),
        || info!("nested chain complete"),
    );

    // Paused group
    for member in 0..3u32 {
        let group_clock = clock.clone();
        runner.run_then(
            Sequence::new().wait(move || {
                let duration = Duration::from_secs(2 + u64::from(member));
                wait_for_seconds(duration, &group_clock, &CancelToken::none())
            }),
            group.token(),
            move || info!(member, "group member finished"),
        );
    }
}
