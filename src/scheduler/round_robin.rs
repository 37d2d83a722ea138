use std::collections::VecDeque;

use super::{DispatchError, Scheduler, SchedulingDecision, ThreadKey, TimeSlice, Workload};
use crate::{core::state::BurstKind, error::ConfigError};

/// Single FIFO ready queue with a fixed quantum. Burst splitting happens in
/// the driver; this only reports how much of the next burst may run.
#[derive(Debug)]
pub struct RoundRobinScheduler {
    ready: VecDeque<ThreadKey>,
    quantum: u64,
}

impl RoundRobinScheduler {
    pub fn new(time_slice: i64) -> Result<Self, ConfigError> {
        if time_slice <= 0 {
            return Err(ConfigError::InvalidTimeSlice {
                policy: "RR",
                slice: time_slice,
            });
        }
        Ok(Self {
            ready: VecDeque::new(),
            quantum: time_slice as u64,
        })
    }
}

impl Scheduler for RoundRobinScheduler {
    fn name(&self) -> &'static str {
        "RR"
    }

    fn time_slice(&self) -> TimeSlice {
        TimeSlice::Bounded(self.quantum)
    }

    fn add_to_ready_queue(&mut self, _ctx: &Workload, thread: ThreadKey) {
        self.ready.push_back(thread);
    }

    fn get_next_thread(&mut self, ctx: &Workload) -> Result<SchedulingDecision, DispatchError> {
        let count = self.ready.len();
        let thread = self
            .ready
            .pop_front()
            .ok_or(DispatchError::EmptyReadyQueue)?;

        // A READY thread always has a CPU burst at the front; the driver
        // rejects the dispatch otherwise.
        let remaining = ctx
            .thread(thread)
            .next_burst()
            .filter(|b| b.kind == BurstKind::Cpu)
            .map_or(self.quantum, |b| b.remaining);
        let slice = self.quantum.min(remaining);

        Ok(SchedulingDecision {
            thread,
            time_slice: TimeSlice::Bounded(slice),
            explanation: format!(
                "Selected from {count} threads. Allotted time slice of {slice}."
            ),
        })
    }

    fn size(&self) -> usize {
        self.ready.len()
    }
}
