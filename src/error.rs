use std::path::PathBuf;

use crate::core::{BurstKind, CpuState, EventKind, ProcessId, ThreadRef, ThreadState, Ticks};

/// Rejected scheduler configuration. Raised before any event is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown scheduling policy: {0}")]
    UnknownPolicy(String),

    #[error("invalid time slice {slice} for {policy} scheduler")]
    InvalidTimeSlice { policy: &'static str, slice: i64 },
}

/// Structural problems with a workload built in memory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkloadError {
    #[error("process {0} declared more than once")]
    DuplicateProcess(ProcessId),

    #[error("thread added to unknown process {0}")]
    UnknownProcess(ProcessId),

    // Bursts alternate CPU/IO starting and ending on CPU, so the count is odd.
    #[error("malformed burst sequence of length {count}")]
    MalformedBursts { count: usize },

    #[error("total CPU demand of {thread} does not fit in a tick counter")]
    DemandOverflow { thread: ThreadRef },
}

/// Failure to read a workload description.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read workload file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected end of input while reading {field}")]
    UnexpectedEof { field: &'static str },

    #[error("expected integer for {field}, found {token:?}")]
    InvalidInteger { field: &'static str, token: String },

    #[error("{field} must be non-negative, found {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("invalid process priority {0}, expected 0..=3")]
    InvalidPriority(i64),

    #[error(transparent)]
    Workload(#[from] WorkloadError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid transition for {thread} at t={time}: {from} -> {to}")]
pub struct TransitionError {
    pub thread: ThreadRef,
    pub from: ThreadState,
    pub to: ThreadState,
    pub time: Ticks,
}

/// Invariant violations detected while the simulation runs. Any of these means
/// the collected metrics cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("dispatcher invoked at t={time} with an empty ready queue")]
    EmptyReadyQueue { time: Ticks },

    #[error("{kind} event at t={time} has no subject thread")]
    MissingThread { kind: EventKind, time: Ticks },

    #[error("{kind} event at t={time} found CPU in state {cpu:?}")]
    UnexpectedCpuState {
        kind: EventKind,
        time: Ticks,
        cpu: CpuState,
    },

    #[error("{thread} expected a {expected} burst at t={time}")]
    UnexpectedBurst {
        thread: ThreadRef,
        expected: BurstKind,
        time: Ticks,
    },

    #[error("{thread} ran {elapsed} ticks but only {remaining} remained in its burst")]
    SliceOverrun {
        thread: ThreadRef,
        elapsed: Ticks,
        remaining: Ticks,
    },

    #[error("event at t={event_time} is earlier than the clock at t={now}")]
    ClockRegression { now: Ticks, event_time: Ticks },

    #[error("{kind} at t={time} schedules a follow-up {delta} ticks later, past the end of the clock")]
    TimeOverflow {
        kind: EventKind,
        time: Ticks,
        delta: Ticks,
    },

    #[error("event queue drained with {thread} still {state}")]
    Unfinished { thread: ThreadRef, state: ThreadState },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error(transparent)]
    Sim(#[from] SimError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
