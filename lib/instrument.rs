//! Optional, caller-supplied instrumentation for the simulation pipeline.
//!
//! Every pipeline entry point has a `*_with` variant accepting a
//! `&dyn Instrument`; the plain variants pass [`NoInstrument`]. Nothing here
//! touches global state unless the caller installs a `tracing` subscriber.

use std::{
    cell::RefCell,
    fmt,
    time::{ Duration, Instant },
};

/// Named stages of the simulation pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Operators,
    Zeeman,
    Coupling,
    Eigensystem,
    TransitionMatrix,
    Intensities,
    Collect,
    FirstOrder,
    Reduce,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Operators => "spin operators",
            Self::Zeeman => "zeeman terms",
            Self::Coupling => "coupling terms",
            Self::Eigensystem => "eigensystem",
            Self::TransitionMatrix => "transition matrix",
            Self::Intensities => "intensity matrix",
            Self::Collect => "peak collection",
            Self::FirstOrder => "first-order multiplets",
            Self::Reduce => "peak reduction",
        };
        f.write_str(name)
    }
}

/// Receives progress and timing events.
///
/// All methods default to doing nothing.
pub trait Instrument {
    /// Called when a stage begins.
    fn enter(&self, _stage: Stage) { }

    /// Called when a stage ends, with its wall-clock duration.
    fn exit(&self, _stage: Stage, _elapsed: Duration) { }

    /// Free-form detail attached to a stage.
    fn note(&self, _stage: Stage, _msg: &str) { }
}

/// Run `f` as `stage`, reporting entry and exit to `instr`.
pub(crate) fn timed<T, F>(instr: &dyn Instrument, stage: Stage, f: F) -> T
where F: FnOnce() -> T
{
    instr.enter(stage);
    let t0 = Instant::now();
    let out = f();
    instr.exit(stage, t0.elapsed());
    out
}

/// Discards all events.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoInstrument;

impl Instrument for NoInstrument { }

/// Forwards events to `tracing` at debug level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingInstrument;

impl Instrument for TracingInstrument {
    fn enter(&self, stage: Stage) {
        tracing::debug!(%stage, "begin");
    }

    fn exit(&self, stage: Stage, elapsed: Duration) {
        tracing::debug!(%stage, elapsed_ms = elapsed.as_secs_f64() * 1e3, "done");
    }

    fn note(&self, stage: Stage, msg: &str) {
        tracing::debug!(%stage, "{}", msg);
    }
}

/// Collects completed stages and notes in memory.
#[derive(Debug, Default)]
pub struct Recorder {
    stages: RefCell<Vec<(Stage, Duration)>>,
    notes: RefCell<Vec<(Stage, String)>>,
}

impl Recorder {
    /// Create a new, empty `Recorder`.
    pub fn new() -> Self { Self::default() }

    /// Completed stages in order of completion.
    pub fn stages(&self) -> Vec<Stage> {
        self.stages.borrow().iter().map(|(s, _)| *s).collect()
    }

    /// Total time recorded for a stage across all of its runs.
    pub fn elapsed(&self, stage: Stage) -> Duration {
        self.stages.borrow().iter()
            .filter(|(s, _)| *s == stage)
            .map(|(_, t)| *t)
            .sum()
    }

    /// Notes in the order they were received.
    pub fn notes(&self) -> Vec<(Stage, String)> { self.notes.borrow().clone() }
}

impl Instrument for Recorder {
    fn exit(&self, stage: Stage, elapsed: Duration) {
        self.stages.borrow_mut().push((stage, elapsed));
    }

    fn note(&self, stage: Stage, msg: &str) {
        self.notes.borrow_mut().push((stage, msg.to_string()));
    }
}
