use std::collections::VecDeque;

use super::{
    DispatchError, Scheduler, SchedulingDecision, ThreadKey, TimeSlice, UNBOUNDED_SLICE, Workload,
};
use crate::error::ConfigError;

#[derive(Debug, Default)]
pub struct FcfsScheduler {
    ready: VecDeque<ThreadKey>,
}

impl FcfsScheduler {
    pub fn new(time_slice: i64) -> Result<Self, ConfigError> {
        if time_slice != UNBOUNDED_SLICE {
            return Err(ConfigError::InvalidTimeSlice {
                policy: "FCFS",
                slice: time_slice,
            });
        }
        Ok(Self::default())
    }
}

impl Scheduler for FcfsScheduler {
    fn name(&self) -> &'static str {
        "FCFS"
    }

    fn time_slice(&self) -> TimeSlice {
        TimeSlice::Unbounded
    }

    fn add_to_ready_queue(&mut self, _ctx: &Workload, thread: ThreadKey) {
        self.ready.push_back(thread);
    }

    fn get_next_thread(&mut self, _ctx: &Workload) -> Result<SchedulingDecision, DispatchError> {
        let count = self.ready.len();
        let thread = self
            .ready
            .pop_front()
            .ok_or(DispatchError::EmptyReadyQueue)?;

        Ok(SchedulingDecision {
            thread,
            time_slice: TimeSlice::Unbounded,
            explanation: format!(
                "Selected from {count} threads. Will run to completion of burst."
            ),
        })
    }

    fn size(&self) -> usize {
        self.ready.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::ProcessPriority;

    #[test]
    fn rejects_bounded_slice() {
        assert_eq!(
            FcfsScheduler::new(5).unwrap_err(),
            ConfigError::InvalidTimeSlice {
                policy: "FCFS",
                slice: 5
            }
        );
        assert!(FcfsScheduler::new(0).is_err());
    }

    #[test]
    fn strict_fifo_ignores_priority_and_length() {
        let mut w = Workload::new(0);
        w.add_process(0, ProcessPriority::Batch).unwrap();
        w.add_process(1, ProcessPriority::System).unwrap();
        let long = w.add_thread(0, 0, &[50]).unwrap();
        let short = w.add_thread(1, 0, &[1]).unwrap();

        let mut s = FcfsScheduler::new(UNBOUNDED_SLICE).unwrap();
        s.add_to_ready_queue(&w, long);
        s.add_to_ready_queue(&w, short);
        assert_eq!(s.size(), 2);

        let first = s.get_next_thread(&w).unwrap();
        assert_eq!(first.thread, long);
        assert_eq!(first.time_slice, TimeSlice::Unbounded);
        assert!(first.explanation.contains("Selected from 2 threads"));
        assert_eq!(s.get_next_thread(&w).unwrap().thread, short);
        assert_eq!(
            s.get_next_thread(&w).unwrap_err(),
            DispatchError::EmptyReadyQueue
        );
    }
}
