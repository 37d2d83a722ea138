pub mod fcfs;
pub mod priority;
pub mod round_robin;

use std::{fmt, str::FromStr};

use crate::{
    core::state::{ThreadKey, Ticks, Workload},
    error::ConfigError,
};
pub use fcfs::FcfsScheduler;
pub use priority::PriorityScheduler;
pub use round_robin::RoundRobinScheduler;

/// Raw time slice meaning "run until the current CPU burst completes".
pub const UNBOUNDED_SLICE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSlice {
    Unbounded,
    Bounded(Ticks),
}

impl TimeSlice {
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Unbounded => UNBOUNDED_SLICE,
            Self::Bounded(q) => q as i64,
        }
    }

    /// Ticks granted against a burst with `remaining` ticks left.
    pub fn clip(self, remaining: Ticks) -> Ticks {
        match self {
            Self::Unbounded => remaining,
            Self::Bounded(q) => q.min(remaining),
        }
    }
}

impl fmt::Display for TimeSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingDecision {
    pub thread: ThreadKey,
    pub time_slice: TimeSlice,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    EmptyReadyQueue,
}

/// A selection policy over the ready set. Holds keys only; thread state lives
/// in the [`Workload`].
pub trait Scheduler {
    fn name(&self) -> &'static str;

    fn time_slice(&self) -> TimeSlice;

    /// `thread` must already be READY.
    fn add_to_ready_queue(&mut self, ctx: &Workload, thread: ThreadKey);

    fn get_next_thread(&mut self, ctx: &Workload) -> Result<SchedulingDecision, DispatchError>;

    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn time_slice(&self) -> TimeSlice {
        (**self).time_slice()
    }

    fn add_to_ready_queue(&mut self, ctx: &Workload, thread: ThreadKey) {
        (**self).add_to_ready_queue(ctx, thread)
    }

    fn get_next_thread(&mut self, ctx: &Workload) -> Result<SchedulingDecision, DispatchError> {
        (**self).get_next_thread(ctx)
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    Fcfs,
    RoundRobin,
    Priority,
}

impl Policy {
    pub fn build(self, time_slice: i64) -> Result<Box<dyn Scheduler>, ConfigError> {
        Ok(match self {
            Self::Fcfs => Box::new(FcfsScheduler::new(time_slice)?),
            Self::RoundRobin => Box::new(RoundRobinScheduler::new(time_slice)?),
            Self::Priority => Box::new(PriorityScheduler::new(time_slice)?),
        })
    }
}

impl FromStr for Policy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FCFS" => Ok(Self::Fcfs),
            "RR" => Ok(Self::RoundRobin),
            "PRIORITY" => Ok(Self::Priority),
            _ => Err(ConfigError::UnknownPolicy(s.to_owned())),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fcfs => "FCFS",
            Self::RoundRobin => "RR",
            Self::Priority => "PRIORITY",
        };
        f.write_str(name)
    }
}
