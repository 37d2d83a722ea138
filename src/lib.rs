//! Discrete-event simulation of single-CPU thread scheduling.
//!
//! A [`Workload`] of processes and threads, each an alternating sequence of
//! CPU and I/O bursts, is driven through a [`Simulation`] under a pluggable
//! [`Scheduler`] policy. Once the event queue drains, per-thread and
//! system-wide timing metrics are derived from terminal thread state.

pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{Simulation, StateTransition, SystemStats, ThreadMetrics, Workload};
pub use error::{ConfigError, Error, LoadError, Result, SimError, WorkloadError};
pub use scheduler::{Policy, Scheduler, SchedulingDecision, TimeSlice};

/// Builds the scheduler for `policy` and runs `workload` to completion.
pub fn simulate(
    workload: Workload,
    policy: Policy,
    time_slice: i64,
) -> Result<Simulation<Box<dyn Scheduler>>> {
    let scheduler = policy.build(time_slice)?;
    let mut simulation = Simulation::new(workload, scheduler);
    simulation.run()?;
    Ok(simulation)
}
