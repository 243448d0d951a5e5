//! `run` command: drives the engine headlessly with synthetic agents.

use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::SyntheticAgents;
use crate::cli::args::RunArgs;
use crate::cli::commands::Shutdown;
use crate::config::{EngineConfig, load_config};
use crate::engine::{Engine, FrameInputs, TickReport};
use crate::error::CollapseError;
use crate::observability::{Event, EventEmitter, RunSummary, StopReason};

/// Salt separating the agents' RNG stream from the engine's.
const AGENT_SEED_SALT: u64 = 0x5eed_a9e7_c011_a95e;

/// Ticks between cooperative yields when fast-forwarding.
const YIELD_EVERY: u64 = 1024;

/// Tick budget derived from the command-line timing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Schedule {
    /// Stop after this many ticks.
    total_frames: Option<u64>,
    /// Reset the engine every this many ticks.
    reset_frames: Option<u64>,
}

impl Schedule {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn new(fps: u32, duration: Option<Duration>, reset_every: Option<Duration>) -> Self {
        let fps = f64::from(fps);
        let to_frames = |d: Duration| (d.as_secs_f64() * fps).round() as u64;
        Self {
            total_frames: duration.map(to_frames),
            reset_frames: reset_every.map(|d| to_frames(d).max(1)),
        }
    }

    fn finished(&self, frames: u64) -> bool {
        self.total_frames.is_some_and(|total| frames >= total)
    }

    fn reset_due(&self, frames: u64) -> bool {
        self.reset_frames
            .is_some_and(|every| frames > 0 && frames.is_multiple_of(every))
    }
}

/// Runs the engine until the duration elapses or shutdown is requested.
///
/// Returns why the run stopped.
///
/// # Errors
///
/// Returns a usage error for out-of-range options, a config error if the
/// configuration cannot be loaded, or an I/O error if snapshot output or
/// the events file fails.
pub async fn run(
    args: &RunArgs,
    quiet: bool,
    shutdown: &Shutdown,
) -> Result<StopReason, CollapseError> {
    if !(0.0..=1.0).contains(&args.unavailable_rate) {
        return Err(CollapseError::Usage(format!(
            "--unavailable-rate must be in [0, 1], got {}",
            args.unavailable_rate
        )));
    }

    let config = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "loading configuration");
            let result = load_config(path)?;
            for warning in &result.warnings {
                warn!(
                    location = warning.location.as_deref().unwrap_or("<unknown>"),
                    "{}",
                    warning.message
                );
            }
            result.config
        }
        None => EngineConfig::default(),
    };

    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let events = match args.events_file {
        Some(ref path) => EventEmitter::from_file(path)?,
        None if quiet => EventEmitter::noop(),
        None => EventEmitter::stderr(),
    };

    let seed = args
        .seed
        .or(config.particles.seed)
        .unwrap_or_else(rand::random);
    let mut engine = Engine::with_seed(config, seed);
    let mut agents = SyntheticAgents::new(args.scenario, seed ^ AGENT_SEED_SALT)
        .with_unavailable_rate(args.unavailable_rate);

    let run_id = Uuid::new_v4();
    info!(%run_id, scenario = %args.scenario, seed, fps = args.fps, "run started");
    events.emit(Event::RunStarted {
        timestamp: Utc::now(),
        run_id,
        scenario: args.scenario.to_string(),
        seed,
    });

    let schedule = Schedule::new(args.fps, args.duration, args.reset_every);
    let frame_dt = 1.0 / f64::from(args.fps);
    let mut interval = args
        .realtime
        .then(|| tokio::time::interval(Duration::from_secs_f64(frame_dt)));
    let mut out = BufWriter::new(std::io::stdout());
    let mut reseeds: u64 = 0;
    let started = Instant::now();

    let reason = loop {
        if shutdown.is_triggered() {
            break shutdown.reason().unwrap_or(StopReason::Interrupted);
        }
        if schedule.finished(engine.frames()) {
            break StopReason::Completed;
        }

        if let Some(ref mut interval) = interval {
            tokio::select! {
                _ = interval.tick() => {}
                () = shutdown.token().cancelled() => continue,
            }
        } else if engine.frames().is_multiple_of(YIELD_EVERY) {
            tokio::task::yield_now().await;
        }

        if schedule.reset_due(engine.frames()) {
            engine.reset();
            events.emit(Event::EngineReset {
                timestamp: Utc::now(),
                frame: engine.frames(),
                sim_time: engine.time(),
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let timestamp = (engine.frames() + 1) as f64 * frame_dt;
        let report = engine.tick(&FrameInputs::at(timestamp), &mut agents);

        if !engine.agents_frozen() {
            agents.step(report.tick.dt);
        }
        if report.reseed_requested {
            reseeds += 1;
            agents.reseed(seed ^ AGENT_SEED_SALT ^ reseeds.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        }

        emit_tick_events(&events, &report);

        if let Some(every) = args.snapshot_every
            && report.tick.frame.is_multiple_of(every)
        {
            serde_json::to_writer(&mut out, &engine.snapshot())?;
            out.write_all(b"\n")?;
        }
    };
    out.flush()?;

    let summary = RunSummary {
        frames: engine.frames(),
        sim_time_secs: engine.time(),
        cycles: engine.cycles(),
        phase_transitions: engine.transitions(),
        resets: engine.resets(),
        wall_secs: started.elapsed().as_secs_f64(),
    };
    info!(%summary, reason = ?reason, events = events.event_count(), "run stopped");
    events.emit(Event::RunStopped {
        timestamp: Utc::now(),
        reason,
        summary: Some(summary),
    });

    Ok(reason)
}

/// Translates one tick's report into structured events.
fn emit_tick_events(events: &EventEmitter, report: &TickReport) {
    let frame = report.tick.frame;
    if let Some(transition) = report.transition {
        events.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            frame,
            sim_time: report.tick.time,
            phase: transition.to,
            phase_index: transition.to.index(),
            from: transition.from,
            reason: transition.reason,
        });
    }
    if let Some(burst) = report.shard_burst {
        events.emit(Event::ShardBurst {
            timestamp: Utc::now(),
            frame,
            requested: burst.requested,
            spawned: burst.spawned,
        });
    }
    if report.reseed_requested {
        events.emit(Event::ReseedRequested {
            timestamp: Utc::now(),
            frame,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::agents::Scenario;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            scenario: Scenario::Contested,
            seed: Some(1),
            duration: Some(Duration::from_secs(2)),
            fps: 60,
            realtime: false,
            snapshot_every: None,
            unavailable_rate: 0.0,
            events_file: None,
            metrics_port: None,
            reset_every: None,
        }
    }

    #[test]
    fn schedule_converts_durations_to_frames() {
        let schedule = Schedule::new(
            60,
            Some(Duration::from_secs(30)),
            Some(Duration::from_secs(2)),
        );
        assert_eq!(schedule.total_frames, Some(1800));
        assert_eq!(schedule.reset_frames, Some(120));
        assert!(!schedule.finished(1799));
        assert!(schedule.finished(1800));
        assert!(!schedule.reset_due(0));
        assert!(schedule.reset_due(240));
        assert!(!schedule.reset_due(241));
    }

    #[test]
    fn schedule_without_limits_runs_forever() {
        let schedule = Schedule::new(60, None, None);
        assert!(!schedule.finished(u64::MAX));
        assert!(!schedule.reset_due(120));
    }

    #[test]
    fn tiny_reset_interval_still_advances() {
        let schedule = Schedule::new(60, None, Some(Duration::from_millis(1)));
        assert_eq!(schedule.reset_frames, Some(1));
    }

    #[tokio::test]
    async fn run_completes_after_duration() {
        let reason = run(&args(), true, &Shutdown::new()).await.unwrap();
        assert_eq!(reason, StopReason::Completed);
    }

    #[tokio::test]
    async fn run_stops_when_already_shut_down() {
        let shutdown = Shutdown::new();
        shutdown.trigger(StopReason::Terminated);
        let mut args = args();
        args.duration = None;
        let reason = run(&args, true, &shutdown).await.unwrap();
        assert_eq!(reason, StopReason::Terminated);
    }

    #[tokio::test]
    async fn run_rejects_bad_unavailable_rate() {
        let mut args = args();
        args.unavailable_rate = 1.5;
        let err = run(&args, true, &Shutdown::new()).await.unwrap_err();
        assert!(matches!(err, CollapseError::Usage(_)));
    }

    #[tokio::test]
    async fn run_writes_events_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let mut args = args();
        args.duration = Some(Duration::from_secs(8));
        args.events_file = Some(path.clone());
        run(&args, true, &Shutdown::new()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let types: Vec<String> = contents
            .lines()
            .map(|l| {
                let v: serde_json::Value = serde_json::from_str(l).unwrap();
                v["type"].as_str().unwrap().to_owned()
            })
            .collect();
        assert_eq!(types.first().map(String::as_str), Some("RunStarted"));
        assert_eq!(types.last().map(String::as_str), Some("RunStopped"));
        assert!(types.iter().any(|t| t == "PhaseEntered"));
    }

    #[test]
    fn tick_events_cover_report_fields() {
        #[derive(Clone)]
        struct Capture(Arc<Mutex<Vec<u8>>>);
        impl Write for Capture {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let capture = Capture(Arc::new(Mutex::new(Vec::new())));
        let events = EventEmitter::new(Box::new(capture.clone()));
        let mut engine = Engine::with_seed(EngineConfig::default(), 5);
        let mut agents = SyntheticAgents::new(Scenario::Contested, 5);
        for i in 1..=60 * 30 {
            let report = engine.tick(&FrameInputs::at(f64::from(i) / 60.0), &mut agents);
            emit_tick_events(&events, &report);
        }

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("\"type\":\"ShardBurst\""));
        assert!(text.contains("\"type\":\"ReseedRequested\""));
    }
}
