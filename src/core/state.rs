use std::{collections::VecDeque, fmt};

use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};

use crate::error::{TransitionError, WorkloadError};

pub type Ticks = u64;
pub type ProcessId = u32;
// Index of a thread within its owning process
pub type ThreadId = usize;

new_key_type! {
    pub struct ThreadKey;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BurstKind {
    Cpu,
    Io,
}

impl fmt::Display for BurstKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("CPU"),
            Self::Io => f.write_str("IO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    pub kind: BurstKind,
    pub length: Ticks,
    pub remaining: Ticks,
}

impl Burst {
    pub fn new(kind: BurstKind, length: Ticks) -> Self {
        Self {
            kind,
            length,
            remaining: length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    New,
    Ready,
    Running,
    Blocked,
    Exit,
}

impl ThreadState {
    pub fn can_transition_to(self, to: ThreadState) -> bool {
        use ThreadState::*;
        matches!(
            (self, to),
            (New, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Running, Blocked)
                | (Blocked, Ready)
                | (Running, Exit)
        )
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "NEW",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Exit => "EXIT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessPriority {
    System = 0,
    Interactive = 1,
    Normal = 2,
    Batch = 3,
}

impl ProcessPriority {
    pub const ALL: [ProcessPriority; 4] = [
        ProcessPriority::System,
        ProcessPriority::Interactive,
        ProcessPriority::Normal,
        ProcessPriority::Batch,
    ];

    pub fn from_level(level: i64) -> Option<Self> {
        Self::ALL.get(usize::try_from(level).ok()?).copied()
    }

    pub fn level(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ProcessPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::System => "SYSTEM",
            Self::Interactive => "INTERACTIVE",
            Self::Normal => "NORMAL",
            Self::Batch => "BATCH",
        };
        f.write_str(name)
    }
}

/// Human-facing identity of a thread, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadRef {
    pub process: ProcessId,
    pub thread: ThreadId,
}

impl fmt::Display for ThreadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread {} of process {}", self.thread, self.process)
    }
}

#[derive(Debug, Clone)]
pub struct Thread {
    pub id: ThreadId,
    pub process_id: ProcessId,
    pub priority: ProcessPriority,
    pub arrival_time: Ticks,
    pub state: ThreadState,
    pub previous_state: ThreadState,
    pub state_change_time: Ticks,
    pub bursts: VecDeque<Burst>,
    // First transition into RUNNING
    pub start_time: Option<Ticks>,
    pub end_time: Option<Ticks>,
    pub service_time: Ticks,
    pub io_time: Ticks,
    // As declared; `bursts` is consumed while the thread runs
    burst_lengths: Vec<Ticks>,
    cpu_demand: Ticks,
}

impl Thread {
    /// Builds a NEW thread from alternating CPU/IO burst lengths.
    ///
    /// The first, last and every even-indexed length is a CPU burst, so the
    /// slice must have odd length.
    pub fn new(
        id: ThreadId,
        process_id: ProcessId,
        priority: ProcessPriority,
        arrival_time: Ticks,
        burst_lengths: &[Ticks],
    ) -> Result<Self, WorkloadError> {
        if burst_lengths.len() % 2 == 0 {
            return Err(WorkloadError::MalformedBursts {
                count: burst_lengths.len(),
            });
        }

        let bursts: VecDeque<Burst> = burst_lengths
            .iter()
            .enumerate()
            .map(|(n, &len)| {
                let kind = if n % 2 == 0 {
                    BurstKind::Cpu
                } else {
                    BurstKind::Io
                };
                Burst::new(kind, len)
            })
            .collect();
        let cpu_demand = bursts
            .iter()
            .filter(|b| b.kind == BurstKind::Cpu)
            .try_fold(0 as Ticks, |sum, b| sum.checked_add(b.length))
            .ok_or(WorkloadError::DemandOverflow {
                thread: ThreadRef {
                    process: process_id,
                    thread: id,
                },
            })?;

        Ok(Self {
            id,
            process_id,
            priority,
            arrival_time,
            state: ThreadState::New,
            previous_state: ThreadState::New,
            state_change_time: arrival_time,
            bursts,
            start_time: None,
            end_time: None,
            service_time: 0,
            io_time: 0,
            burst_lengths: burst_lengths.to_vec(),
            cpu_demand,
        })
    }

    pub fn reference(&self) -> ThreadRef {
        ThreadRef {
            process: self.process_id,
            thread: self.id,
        }
    }

    /// Moves the thread to `to`, returning the state it left.
    pub fn set_state(&mut self, to: ThreadState, time: Ticks) -> Result<ThreadState, TransitionError> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(TransitionError {
                thread: self.reference(),
                from,
                to,
                time,
            });
        }

        self.previous_state = from;
        self.state = to;
        self.state_change_time = time;
        match to {
            ThreadState::Running if self.start_time.is_none() => self.start_time = Some(time),
            ThreadState::Exit => self.end_time = Some(time),
            _ => {}
        }
        Ok(from)
    }

    pub fn next_burst(&self) -> Option<&Burst> {
        self.bursts.front()
    }

    pub fn next_burst_mut(&mut self) -> Option<&mut Burst> {
        self.bursts.front_mut()
    }

    pub fn pop_burst(&mut self) -> Option<Burst> {
        self.bursts.pop_front()
    }

    /// Burst lengths as declared, unaffected by the run.
    pub fn burst_lengths(&self) -> &[Ticks] {
        &self.burst_lengths
    }

    /// Sum of the original CPU burst lengths.
    pub fn cpu_demand(&self) -> Ticks {
        self.cpu_demand
    }

    pub fn response_time(&self) -> Option<Ticks> {
        Some(self.start_time? - self.arrival_time)
    }

    pub fn turnaround_time(&self) -> Option<Ticks> {
        Some(self.end_time? - self.arrival_time)
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub id: ProcessId,
    pub priority: ProcessPriority,
    pub threads: Vec<ThreadKey>,
}

/// Owner of every process and thread in one simulation run.
#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub threads: SlotMap<ThreadKey, Thread>,
    pub processes: Vec<Process>,
    pub process_index: FxHashMap<ProcessId, usize>,
    pub dispatch_overhead: Ticks,
    // Carried for round-tripping the input format; the simulation ignores it
    pub thread_switch_overhead: Ticks,
}

impl Workload {
    pub fn new(dispatch_overhead: Ticks) -> Self {
        Self {
            dispatch_overhead,
            ..Self::default()
        }
    }

    pub fn add_process(
        &mut self,
        id: ProcessId,
        priority: ProcessPriority,
    ) -> Result<(), WorkloadError> {
        if self.process_index.contains_key(&id) {
            return Err(WorkloadError::DuplicateProcess(id));
        }
        self.process_index.insert(id, self.processes.len());
        self.processes.push(Process {
            id,
            priority,
            threads: Vec::new(),
        });
        Ok(())
    }

    pub fn add_thread(
        &mut self,
        process_id: ProcessId,
        arrival_time: Ticks,
        burst_lengths: &[Ticks],
    ) -> Result<ThreadKey, WorkloadError> {
        let index = *self
            .process_index
            .get(&process_id)
            .ok_or(WorkloadError::UnknownProcess(process_id))?;
        let process = &mut self.processes[index];

        let thread = Thread::new(
            process.threads.len(),
            process_id,
            process.priority,
            arrival_time,
            burst_lengths,
        )?;
        let key = self.threads.insert(thread);
        process.threads.push(key);
        Ok(key)
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.process_index.get(&id).map(|&i| &self.processes[i])
    }

    pub fn thread(&self, key: ThreadKey) -> &Thread {
        &self.threads[key]
    }

    pub fn thread_mut(&mut self, key: ThreadKey) -> &mut Thread {
        &mut self.threads[key]
    }

    /// Thread keys in declaration order.
    pub fn thread_keys(&self) -> impl Iterator<Item = ThreadKey> + '_ {
        self.processes.iter().flat_map(|p| p.threads.iter().copied())
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn count_in_state(&self, state: ThreadState) -> usize {
        self.threads.values().filter(|t| t.state == state).count()
    }
}
