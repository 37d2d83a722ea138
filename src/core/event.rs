use std::{cmp::Reverse, collections::BinaryHeap, fmt};

use crate::{
    core::state::{ThreadKey, ThreadRef, ThreadState, Ticks},
    scheduler::SchedulingDecision,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProcessArrived,
    DispatcherInvoked,
    DispatchCompleted,
    CpuBurstCompleted,
    IoBurstCompleted,
    ProcessPreempted,
    ProcessCompleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProcessArrived => "PROCESS_ARRIVED",
            Self::DispatcherInvoked => "DISPATCHER_INVOKED",
            Self::DispatchCompleted => "DISPATCH_COMPLETED",
            Self::CpuBurstCompleted => "CPU_BURST_COMPLETED",
            Self::IoBurstCompleted => "IO_BURST_COMPLETED",
            Self::ProcessPreempted => "PROCESS_PREEMPTED",
            Self::ProcessCompleted => "PROCESS_COMPLETED",
        };
        f.write_str(name)
    }
}

/// A unit of simulated work, ordered by `(time, seq)`.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub time: Ticks,
    /// Creation order; breaks ties between events at the same time.
    pub seq: u64,
    pub thread: Option<ThreadKey>,
    // Only set on DispatchCompleted
    pub decision: Option<SchedulingDecision>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of pending events. Owns the sequence counter so that `seq`
/// always reflects creation order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        time: Ticks,
        kind: EventKind,
        thread: Option<ThreadKey>,
        decision: Option<SchedulingDecision>,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Event {
            kind,
            time,
            seq,
            thread,
            decision,
        }));
        seq
    }

    pub fn pop_earliest(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(event)| event)
    }

    pub fn peek_time(&self) -> Option<Ticks> {
        self.heap.peek().map(|Reverse(event)| event.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Observable record of one thread state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub time: Ticks,
    pub event: EventKind,
    pub thread: ThreadRef,
    pub from: ThreadState,
    pub to: ThreadState,
    pub explanation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_by_time_then_creation_order() {
        let mut q = EventQueue::new();
        q.push(5, EventKind::ProcessCompleted, None, None);
        q.push(2, EventKind::ProcessArrived, None, None);
        q.push(5, EventKind::DispatcherInvoked, None, None);
        q.push(2, EventKind::IoBurstCompleted, None, None);
        assert_eq!(q.len(), 4);
        assert_eq!(q.peek_time(), Some(2));

        let order: Vec<_> = std::iter::from_fn(|| q.pop_earliest())
            .map(|e| (e.time, e.seq, e.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                (2, 1, EventKind::ProcessArrived),
                (2, 3, EventKind::IoBurstCompleted),
                (5, 0, EventKind::ProcessCompleted),
                (5, 2, EventKind::DispatcherInvoked),
            ]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn sequence_numbers_survive_interleaved_pops() {
        let mut q = EventQueue::new();
        assert_eq!(q.push(1, EventKind::ProcessArrived, None, None), 0);
        q.pop_earliest();
        // Counter is not reset by draining the heap
        assert_eq!(q.push(1, EventKind::ProcessArrived, None, None), 1);
    }
}
