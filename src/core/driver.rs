use tracing::{debug, info, trace};

use super::{
    event::{Event, EventKind, EventQueue, StateTransition},
    observer::Observer,
    state::{BurstKind, ThreadKey, ThreadState, Ticks, Workload},
    stats::{self, SystemStats, ThreadMetrics},
};
use crate::{
    error::SimError,
    scheduler::{DispatchError, Scheduler, SchedulingDecision},
};

/// What the single CPU is doing between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    Idle,
    // DispatcherInvoked queued but not yet handled
    DispatchPending,
    // Context switch in progress; the thread is still READY
    Dispatching(ThreadKey),
    Running(ThreadKey),
}

/// Discrete-event driver for one simulation run over a single CPU.
pub struct Simulation<S: Scheduler> {
    pub ctx: Workload,
    pub scheduler: S,
    events: EventQueue,
    cpu: CpuState,
    now: Ticks,
    dispatch_time: Ticks,
    transitions: Vec<StateTransition>,
    observer: Observer,
}

impl<S: Scheduler> Simulation<S> {
    /// Takes ownership of the workload and queues one arrival per thread in
    /// declaration order.
    pub fn new(ctx: Workload, scheduler: S) -> Self {
        let observer = Observer::new(&ctx);
        let mut sim = Self {
            ctx,
            scheduler,
            events: EventQueue::new(),
            cpu: CpuState::Idle,
            now: 0,
            dispatch_time: 0,
            transitions: Vec::new(),
            observer,
        };

        let arrivals: Vec<(ThreadKey, Ticks)> = sim
            .ctx
            .thread_keys()
            .map(|key| (key, sim.ctx.thread(key).arrival_time))
            .collect();
        for (key, arrival) in arrivals {
            sim.add_event(arrival, EventKind::ProcessArrived, Some(key));
        }
        sim
    }

    pub fn add_event(&mut self, time: Ticks, kind: EventKind, thread: Option<ThreadKey>) -> u64 {
        self.events.push(time, kind, thread, None)
    }

    /// Processes events until the queue drains.
    pub fn run(&mut self) -> Result<(), SimError> {
        info!(
            scheduler = self.scheduler.name(),
            time_slice = %self.scheduler.time_slice(),
            threads = self.ctx.thread_count(),
            "simulation started"
        );

        while let Some(event) = self.events.pop_earliest() {
            if event.time < self.now {
                return Err(SimError::ClockRegression {
                    now: self.now,
                    event_time: event.time,
                });
            }
            trace!(t = event.time, seq = event.seq, kind = %event.kind, "event");

            let before = event
                .thread
                .and_then(|key| self.ctx.threads.get(key))
                .map(|t| t.state);
            self.handle(&event)?;
            self.now = event.time;

            let mut change = None;
            if let (Some(key), Some(from)) = (event.thread, before) {
                if self.ctx.thread(key).state != from {
                    self.record_transition(&event, key, from);
                    change = Some((key, from));
                }
            }

            self.observer
                .observe(&self.ctx, change, self.scheduler.size(), self.cpu)?;
        }

        self.observer.verify_finished(&self.ctx)?;
        info!(total_time = self.now, "simulation completed");
        Ok(())
    }

    fn handle(&mut self, event: &Event) -> Result<(), SimError> {
        match event.kind {
            EventKind::ProcessArrived => self.handle_process_arrived(event),
            EventKind::DispatcherInvoked => self.handle_dispatcher_invoked(event),
            EventKind::DispatchCompleted => self.handle_dispatch_completed(event),
            EventKind::CpuBurstCompleted => self.handle_cpu_burst_completed(event),
            EventKind::IoBurstCompleted => self.handle_io_burst_completed(event),
            EventKind::ProcessPreempted => self.handle_process_preempted(event),
            EventKind::ProcessCompleted => self.handle_process_completed(event),
        }
    }

    fn handle_process_arrived(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.make_ready(key, event.time)?;
        self.invoke_dispatcher_if_idle(event.time);
        Ok(())
    }

    fn handle_dispatcher_invoked(&mut self, event: &Event) -> Result<(), SimError> {
        self.expect_cpu(event, CpuState::DispatchPending)?;

        let decision = self
            .scheduler
            .get_next_thread(&self.ctx)
            .map_err(|DispatchError::EmptyReadyQueue| SimError::EmptyReadyQueue {
                time: event.time,
            })?;
        let key = decision.thread;
        let state = self.ctx.thread(key).state;
        if state != ThreadState::Ready {
            return Err(SimError::InvariantViolation(format!(
                "scheduler selected {} in state {state}",
                self.ctx.thread(key).reference()
            )));
        }
        debug!(
            t = event.time,
            thread = %self.ctx.thread(key).reference(),
            slice = %decision.time_slice,
            "{}",
            decision.explanation
        );

        let overhead = self.ctx.dispatch_overhead;
        let completes = later(event, overhead)?;
        self.dispatch_time += overhead;
        self.cpu = CpuState::Dispatching(key);
        self.events.push(
            completes,
            EventKind::DispatchCompleted,
            Some(key),
            Some(decision),
        );
        Ok(())
    }

    fn handle_dispatch_completed(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.expect_cpu(event, CpuState::Dispatching(key))?;
        let time_slice = event
            .decision
            .as_ref()
            .map(|d: &SchedulingDecision| d.time_slice)
            .ok_or_else(|| {
                SimError::InvariantViolation(format!(
                    "dispatch at t={} carries no scheduling decision",
                    event.time
                ))
            })?;

        let remaining = self.front_burst(key, BurstKind::Cpu, event.time)?;
        let run = time_slice.clip(remaining);
        let kind = if run < remaining {
            EventKind::ProcessPreempted
        } else {
            EventKind::CpuBurstCompleted
        };
        let ends = later(event, run)?;
        self.ctx.thread_mut(key).set_state(ThreadState::Running, event.time)?;
        self.cpu = CpuState::Running(key);
        self.events.push(ends, kind, Some(key), None);
        Ok(())
    }

    fn handle_cpu_burst_completed(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.expect_cpu(event, CpuState::Running(key))?;
        self.front_burst(key, BurstKind::Cpu, event.time)?;

        let thread = self.ctx.thread_mut(key);
        let elapsed = event.time - thread.state_change_time;
        if let Some(burst) = thread.pop_burst() {
            if elapsed != burst.remaining {
                return Err(SimError::SliceOverrun {
                    thread: thread.reference(),
                    elapsed,
                    remaining: burst.remaining,
                });
            }
            thread.service_time += burst.remaining;
        }

        if thread.bursts.is_empty() {
            self.events
                .push(event.time, EventKind::ProcessCompleted, Some(key), None);
            return Ok(());
        }

        let io = self.front_burst(key, BurstKind::Io, event.time)?;
        let unblocks = later(event, io)?;
        self.ctx.thread_mut(key).set_state(ThreadState::Blocked, event.time)?;
        self.cpu = CpuState::Idle;
        self.events
            .push(unblocks, EventKind::IoBurstCompleted, Some(key), None);
        self.invoke_dispatcher_if_idle(event.time);
        Ok(())
    }

    fn handle_io_burst_completed(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.front_burst(key, BurstKind::Io, event.time)?;

        let thread = self.ctx.thread_mut(key);
        if thread.state != ThreadState::Blocked {
            return Err(SimError::InvariantViolation(format!(
                "{} finished IO while {}",
                thread.reference(),
                thread.state
            )));
        }
        if let Some(burst) = thread.pop_burst() {
            thread.io_time += burst.length;
        }

        self.make_ready(key, event.time)?;
        self.invoke_dispatcher_if_idle(event.time);
        Ok(())
    }

    fn handle_process_preempted(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.expect_cpu(event, CpuState::Running(key))?;
        let remaining = self.front_burst(key, BurstKind::Cpu, event.time)?;

        let thread = self.ctx.thread_mut(key);
        let elapsed = event.time - thread.state_change_time;
        if elapsed >= remaining {
            return Err(SimError::SliceOverrun {
                thread: thread.reference(),
                elapsed,
                remaining,
            });
        }
        if let Some(burst) = thread.next_burst_mut() {
            burst.remaining -= elapsed;
        }
        thread.service_time += elapsed;

        self.cpu = CpuState::Idle;
        self.make_ready(key, event.time)?;
        self.invoke_dispatcher_if_idle(event.time);
        Ok(())
    }

    fn handle_process_completed(&mut self, event: &Event) -> Result<(), SimError> {
        let key = self.subject(event)?;
        self.expect_cpu(event, CpuState::Running(key))?;

        let thread = self.ctx.thread_mut(key);
        if !thread.bursts.is_empty() {
            return Err(SimError::InvariantViolation(format!(
                "{} completed with {} bursts left",
                thread.reference(),
                thread.bursts.len()
            )));
        }
        thread.set_state(ThreadState::Exit, event.time)?;

        self.cpu = CpuState::Idle;
        self.invoke_dispatcher_if_idle(event.time);
        Ok(())
    }

    // Thread must be fully READY before the scheduler sees it.
    fn make_ready(&mut self, key: ThreadKey, time: Ticks) -> Result<(), SimError> {
        self.ctx.thread_mut(key).set_state(ThreadState::Ready, time)?;
        self.scheduler.add_to_ready_queue(&self.ctx, key);
        Ok(())
    }

    fn invoke_dispatcher_if_idle(&mut self, time: Ticks) {
        if self.cpu == CpuState::Idle && !self.scheduler.is_empty() {
            self.cpu = CpuState::DispatchPending;
            self.events
                .push(time, EventKind::DispatcherInvoked, None, None);
        }
    }

    fn subject(&self, event: &Event) -> Result<ThreadKey, SimError> {
        event
            .thread
            .filter(|&key| self.ctx.threads.contains_key(key))
            .ok_or(SimError::MissingThread {
                kind: event.kind,
                time: event.time,
            })
    }

    fn expect_cpu(&self, event: &Event, expected: CpuState) -> Result<(), SimError> {
        if self.cpu != expected {
            return Err(SimError::UnexpectedCpuState {
                kind: event.kind,
                time: event.time,
                cpu: self.cpu,
            });
        }
        Ok(())
    }

    // Remaining length of the front burst, which must be of `kind`.
    fn front_burst(&self, key: ThreadKey, kind: BurstKind, time: Ticks) -> Result<Ticks, SimError> {
        let thread = self.ctx.thread(key);
        match thread.next_burst() {
            Some(burst) if burst.kind == kind => Ok(burst.remaining),
            _ => Err(SimError::UnexpectedBurst {
                thread: thread.reference(),
                expected: kind,
                time,
            }),
        }
    }

    fn record_transition(&mut self, event: &Event, key: ThreadKey, from: ThreadState) {
        let thread = self.ctx.thread(key);
        let transition = StateTransition {
            time: event.time,
            event: event.kind,
            thread: thread.reference(),
            from,
            to: thread.state,
            explanation: event.decision.as_ref().map(|d| d.explanation.clone()),
        };
        debug!(
            t = transition.time,
            thread = %transition.thread,
            "{} -> {}",
            transition.from,
            transition.to
        );
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Time of the last processed event.
    pub fn now(&self) -> Ticks {
        self.now
    }

    pub fn cpu(&self) -> CpuState {
        self.cpu
    }

    pub fn dispatch_time(&self) -> Ticks {
        self.dispatch_time
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    pub fn calculate_statistics(&self) -> SystemStats {
        stats::calculate_statistics(&self.ctx, self.now, self.dispatch_time)
    }

    pub fn thread_metrics(&self) -> Vec<ThreadMetrics> {
        stats::thread_metrics(&self.ctx)
    }
}

// Timestamp `delta` ticks after `event`.
fn later(event: &Event, delta: Ticks) -> Result<Ticks, SimError> {
    event
        .time
        .checked_add(delta)
        .ok_or(SimError::TimeOverflow {
            kind: event.kind,
            time: event.time,
            delta,
        })
}
