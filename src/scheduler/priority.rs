use keyed_priority_queue::KeyedPriorityQueue;

use super::{
    DispatchError, Scheduler, SchedulingDecision, ThreadKey, TimeSlice, UNBOUNDED_SLICE, Workload,
};
use crate::{core::state::ProcessPriority, error::ConfigError};

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
struct Rank {
    priority: ProcessPriority,
    order: u64,
}

// KeyedPriorityQueue is a max-heap; lower priority level and earlier order
// must compare greater.
impl Ord for Rank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Non-preemptive priority policy: the most urgent process class runs first,
/// FIFO within a class.
pub struct PriorityScheduler {
    ready: KeyedPriorityQueue<ThreadKey, Rank>,
    next_order: u64,
}

impl PriorityScheduler {
    pub fn new(time_slice: i64) -> Result<Self, ConfigError> {
        if time_slice != UNBOUNDED_SLICE {
            return Err(ConfigError::InvalidTimeSlice {
                policy: "PRIORITY",
                slice: time_slice,
            });
        }
        Ok(Self {
            ready: KeyedPriorityQueue::new(),
            next_order: 0,
        })
    }
}

impl Scheduler for PriorityScheduler {
    fn name(&self) -> &'static str {
        "PRIORITY"
    }

    fn time_slice(&self) -> TimeSlice {
        TimeSlice::Unbounded
    }

    fn add_to_ready_queue(&mut self, ctx: &Workload, thread: ThreadKey) {
        let rank = Rank {
            priority: ctx.thread(thread).priority,
            order: self.next_order,
        };
        self.next_order += 1;
        self.ready.push(thread, rank);
    }

    fn get_next_thread(&mut self, _ctx: &Workload) -> Result<SchedulingDecision, DispatchError> {
        let count = self.ready.len();
        let (thread, rank) = self.ready.pop().ok_or(DispatchError::EmptyReadyQueue)?;

        Ok(SchedulingDecision {
            thread,
            time_slice: TimeSlice::Unbounded,
            explanation: format!(
                "Selected from {count} threads at highest ready priority {}. Will run to completion of burst.",
                rank.priority
            ),
        })
    }

    fn size(&self) -> usize {
        self.ready.len()
    }
}
