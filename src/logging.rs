// src/logging.rs
//
// Telemetry sinks for episode runs.
// - EventSink: trait used by the research harness
// - NoopSink:  discards all events
// - FileSink:  writes one JSON line per step for offline analysis

use std::fs::File;
use std::io::{self, BufWriter, Write};

use serde_json::json;

use crate::engine::StepOutcome;
use crate::state::WorldState;
use crate::types::Action;

/// Abstract sink for per-step telemetry.
pub trait EventSink {
    fn log_step(&mut self, world: &WorldState, action: &Action, outcome: &StepOutcome);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_step(&mut self, _world: &WorldState, _action: &Action, _outcome: &StepOutcome) {
        // intentionally no-op
    }
}

/// JSONL file sink.
///
/// Each step is written as a single JSON object on its own line. The payload
/// stays small: the action, the outcome, and the running totals needed to
/// reconstruct an episode curve.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Create a new sink writing to `path`.
    pub fn create(path: &str) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl EventSink for FileSink {
    fn log_step(&mut self, world: &WorldState, action: &Action, outcome: &StepOutcome) {
        let line = json!({
            "step": world.current_step,
            "action_type": action.action_type.label(),
            "resource_id": action.resource_id,
            "target_zone": action.target_zone,
            "action_success": outcome.action_success,
            "reward": outcome.reward,
            "new_casualties": outcome.new_casualties,
            "total_casualties": world.total_casualties,
            "total_evacuated": world.total_evacuated,
            "evacuation_rate": world.evacuation_rate(),
            "resources_used": world.resources_used,
            "average_risk": world.average_risk(),
        });

        // If logging fails we don't want to crash the run,
        // so we deliberately ignore I/O errors.
        let _ = writeln!(self.writer, "{line}");
        let _ = self.writer.flush();
    }
}
