//! Structured event stream for engine runs.
//!
//! Discrete, typed events emitted while the engine runs. Events are
//! serialized as newline-delimited JSON (JSONL) and include a monotonically
//! increasing sequence number for ordering guarantees.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::phase::{Phase, TransitionReason};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured duration elapsed.
    Completed,
    /// Interrupted by SIGINT.
    Interrupted,
    /// Terminated by SIGTERM.
    Terminated,
}

/// Summary statistics emitted when a run stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Ticks executed.
    pub frames: u64,
    /// Simulated seconds elapsed.
    pub sim_time_secs: f64,
    /// Completed ORDER → ... → ORDER cycles.
    pub cycles: u64,
    /// Number of phase transitions.
    pub phase_transitions: u64,
    /// Number of external resets.
    pub resets: u64,
    /// Wall-clock seconds elapsed.
    pub wall_secs: f64,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames={} sim_time={:.1}s cycles={} transitions={} resets={} wall={:.1}s",
            self.frames,
            self.sim_time_secs,
            self.cycles,
            self.phase_transitions,
            self.resets,
            self.wall_secs,
        )
    }
}

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a run.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A run has started.
    RunStarted {
        /// When the run started.
        timestamp: DateTime<Utc>,
        /// Unique identifier of this run.
        run_id: Uuid,
        /// Name of the synthetic agent scenario.
        scenario: String,
        /// RNG seed, for reproducing the run.
        seed: u64,
    },

    /// A run has stopped.
    RunStopped {
        /// When the run stopped.
        timestamp: DateTime<Utc>,
        /// Why the run stopped.
        reason: StopReason,
        /// Run summary statistics.
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<RunSummary>,
    },

    /// A new phase has been entered.
    PhaseEntered {
        /// When the transition occurred.
        timestamp: DateTime<Utc>,
        /// Tick on which the transition fired.
        frame: u64,
        /// Simulated time of the transition, in seconds.
        sim_time: f64,
        /// Phase that was entered.
        phase: Phase,
        /// Numeric index of the phase that was entered.
        phase_index: u8,
        /// Phase that was left.
        from: Phase,
        /// Why the guard fired.
        reason: TransitionReason,
    },

    /// The EVENT shard burst was spawned.
    ShardBurst {
        /// When the burst was spawned.
        timestamp: DateTime<Utc>,
        /// Tick of the burst.
        frame: u64,
        /// Shards requested.
        requested: usize,
        /// Shards actually stored (the rest hit pool capacity).
        spawned: usize,
    },

    /// The engine asked the external simulation to reseed.
    ReseedRequested {
        /// When the request was made.
        timestamp: DateTime<Utc>,
        /// Tick of the request.
        frame: u64,
    },

    /// The engine was reset to ORDER.
    EngineReset {
        /// When the reset was applied.
        timestamp: DateTime<Utc>,
        /// Ticks executed before the reset.
        frame: u64,
        /// Simulated time of the reset, in seconds.
        sim_time: f64,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are silently dropped so
/// a broken event sink never stops the engine.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    ///
    /// stdout is reserved for snapshot output.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that silently discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    /// In-memory writer for capturing emitter output in tests.
    #[derive(Clone)]
    struct TestWriter(Arc<StdMutex<Vec<u8>>>);

    impl TestWriter {
        fn new() -> Self {
            Self(Arc::new(StdMutex::new(Vec::new())))
        }

        fn contents(&self) -> String {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).into_owned()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample_event() -> Event {
        Event::RunStarted {
            timestamp: DateTime::parse_from_rfc3339("2026-03-04T10:15:30Z")
                .unwrap()
                .with_timezone(&Utc),
            run_id: Uuid::nil(),
            scenario: "contested".to_owned(),
            seed: 42,
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let json = serde_json::to_string(&sample_event()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "RunStarted");
        assert_eq!(parsed["scenario"], "contested");
        assert_eq!(parsed["seed"], 42);
    }

    #[test]
    fn emitter_writes_valid_jsonl() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(sample_event());

        let output = tw.contents();
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed["type"], "RunStarted");
        assert_eq!(parsed["run_id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(parsed["sequence"], 0);
    }

    #[test]
    fn emitter_increments_sequence() {
        let tw = TestWriter::new();
        let emitter = EventEmitter::new(Box::new(tw.clone()));
        emitter.emit(sample_event());
        emitter.emit(Event::RunStopped {
            timestamp: Utc::now(),
            reason: StopReason::Completed,
            summary: None,
        });

        assert_eq!(emitter.event_count(), 2);

        let lines: Vec<serde_json::Value> = tw
            .contents()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["sequence"], 0);
        assert_eq!(lines[1]["sequence"], 1);
        assert_eq!(lines[1]["reason"], "completed");
        assert!(lines[1].get("summary").is_none());
    }

    #[test]
    fn phase_entered_carries_reason() {
        let event = Event::PhaseEntered {
            timestamp: Utc::now(),
            frame: 250,
            sim_time: 4.17,
            phase: Phase::Schism,
            phase_index: Phase::Schism.index(),
            from: Phase::Order,
            reason: TransitionReason::SustainedDisagreement { held: 4.01 },
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(parsed["phase"], "SCHISM");
        assert_eq!(parsed["from"], "ORDER");
        assert_eq!(parsed["phase_index"], 1);
        assert_eq!(parsed["reason"]["kind"], "sustained_disagreement");
    }

    #[test]
    fn all_event_variants_serialize_to_valid_json() {
        let now = Utc::now();
        let variants: Vec<Event> = vec![
            sample_event(),
            Event::RunStopped {
                timestamp: now,
                reason: StopReason::Interrupted,
                summary: Some(RunSummary {
                    frames: 600,
                    sim_time_secs: 10.0,
                    cycles: 0,
                    phase_transitions: 1,
                    resets: 0,
                    wall_secs: 10.2,
                }),
            },
            Event::ShardBurst {
                timestamp: now,
                frame: 900,
                requested: 12_000,
                spawned: 12_000,
            },
            Event::ReseedRequested {
                timestamp: now,
                frame: 1320,
            },
            Event::EngineReset {
                timestamp: now,
                frame: 10,
                sim_time: 0.16,
            },
        ];

        for variant in &variants {
            let json = serde_json::to_string(variant).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(parsed.get("type").is_some(), "missing type tag: {json}");
        }
    }

    #[test]
    fn envelope_flattens_event_fields() {
        let envelope = EventEnvelope {
            sequence: 7,
            event: sample_event(),
        };
        let json = serde_json::to_string(&envelope).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["sequence"], 7);
        assert_eq!(parsed["type"], "RunStarted");
        assert!(
            parsed.get("event").is_none(),
            "event field should be flattened"
        );
    }

    #[test]
    fn run_summary_display() {
        let summary = RunSummary {
            frames: 60,
            sim_time_secs: 1.0,
            cycles: 2,
            phase_transitions: 8,
            resets: 1,
            wall_secs: 0.5,
        };
        assert_eq!(
            summary.to_string(),
            "frames=60 sim_time=1.0s cycles=2 transitions=8 resets=1 wall=0.5s"
        );
    }
}
