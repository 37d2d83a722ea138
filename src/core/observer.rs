use super::{
    driver::CpuState,
    state::{ThreadKey, ThreadState, Workload},
};
use crate::error::SimError;

/// Cross-checks CPU, ready set and thread states after every event.
///
/// READY and RUNNING populations are tallied from the transitions the driver
/// reports, so each check costs the same no matter how many threads exist.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
    ready: usize,
    running: usize,
}

impl Observer {
    /// Takes the initial tallies from `ctx`.
    pub fn new(ctx: &Workload) -> Self {
        let mut observer = Self::default();
        for thread in ctx.threads.values() {
            observer.enter(thread.state);
        }
        observer
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    /// `change` names the thread whose state moved during the step, with the
    /// state it left.
    pub fn observe(
        &mut self,
        ctx: &Workload,
        change: Option<(ThreadKey, ThreadState)>,
        ready_len: usize,
        cpu: CpuState,
    ) -> Result<(), SimError> {
        self.step += 1;

        if let Some((key, from)) = change {
            let thread = ctx.thread(key);
            self.leave(from);
            self.enter(thread.state);
            if thread.state == ThreadState::Exit
                && (thread.end_time.is_none() || !thread.bursts.is_empty())
            {
                return Err(self.violation(format!("{} exited inconsistently", thread.reference())));
            }
        }

        let mut dispatching = 0;
        match cpu {
            CpuState::Running(key) => {
                let state = ctx.thread(key).state;
                if state != ThreadState::Running {
                    return Err(self.violation(format!(
                        "CPU runs {} which is {state}",
                        ctx.thread(key).reference()
                    )));
                }
            }
            CpuState::Dispatching(key) => {
                let state = ctx.thread(key).state;
                if state != ThreadState::Ready {
                    return Err(self.violation(format!(
                        "CPU dispatches {} which is {state}",
                        ctx.thread(key).reference()
                    )));
                }
                dispatching = 1;
            }
            CpuState::Idle | CpuState::DispatchPending => {}
        }

        let running = self.running;
        if running > 1 || (running == 1) != matches!(cpu, CpuState::Running(_)) {
            return Err(self.violation(format!(
                "{running} threads RUNNING with CPU {cpu:?}"
            )));
        }

        let ready = self.ready;
        if ready != ready_len + dispatching {
            return Err(self.violation(format!(
                "{ready} threads READY but ready queue holds {ready_len}"
            )));
        }

        Ok(())
    }

    /// Every thread must have exited once the event queue is empty.
    pub fn verify_finished(&self, ctx: &Workload) -> Result<(), SimError> {
        match ctx.threads.values().find(|t| t.state != ThreadState::Exit) {
            Some(t) => Err(SimError::Unfinished {
                thread: t.reference(),
                state: t.state,
            }),
            None => Ok(()),
        }
    }

    fn enter(&mut self, state: ThreadState) {
        match state {
            ThreadState::Ready => self.ready += 1,
            ThreadState::Running => self.running += 1,
            _ => {}
        }
    }

    fn leave(&mut self, state: ThreadState) {
        match state {
            ThreadState::Ready => self.ready = self.ready.saturating_sub(1),
            ThreadState::Running => self.running = self.running.saturating_sub(1),
            _ => {}
        }
    }

    fn violation(&self, detail: String) -> SimError {
        SimError::InvariantViolation(format!("after event {}: {detail}", self.step))
    }
}
