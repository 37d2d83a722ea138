pub mod driver;
pub mod event;
pub mod observer;
pub mod state;
pub mod stats;

pub use driver::{CpuState, Simulation};
pub use event::{Event, EventKind, EventQueue, StateTransition};
pub use state::{
    Burst, BurstKind, Process, ProcessId, ProcessPriority, Thread, ThreadId, ThreadKey, ThreadRef,
    ThreadState, Ticks, Workload,
};
pub use stats::{PriorityClassStats, SystemStats, ThreadMetrics};
