//! Metrics derived from terminal thread state after a run.

use average::{Estimate, Mean};

use super::state::{ProcessPriority, Thread, ThreadRef, ThreadState, Ticks, Workload};

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMetrics {
    pub thread: ThreadRef,
    pub priority: ProcessPriority,
    pub arrival_time: Ticks,
    pub start_time: Option<Ticks>,
    pub end_time: Option<Ticks>,
    pub service_time: Ticks,
    pub io_time: Ticks,
    pub response_time: Option<Ticks>,
    pub turnaround_time: Option<Ticks>,
    /// Turnaround minus total CPU demand.
    pub wait_time: Option<Ticks>,
}

impl ThreadMetrics {
    pub fn from_thread(thread: &Thread) -> Self {
        let turnaround_time = thread.turnaround_time();
        Self {
            thread: thread.reference(),
            priority: thread.priority,
            arrival_time: thread.arrival_time,
            start_time: thread.start_time,
            end_time: thread.end_time,
            service_time: thread.service_time,
            io_time: thread.io_time,
            response_time: thread.response_time(),
            turnaround_time,
            wait_time: turnaround_time.map(|t| t.saturating_sub(thread.cpu_demand())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityClassStats {
    pub thread_count: usize,
    pub mean_response_time: f64,
    pub mean_turnaround_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemStats {
    pub total_time: Ticks,
    pub service_time: Ticks,
    pub io_time: Ticks,
    pub dispatch_time: Ticks,
    pub idle_time: Ticks,
    pub cpu_utilization: f64,
    pub dispatcher_utilization: f64,
    /// Completed threads per tick.
    pub throughput: f64,
    pub thread_count: usize,
    pub completed_threads: usize,
    pub mean_response_time: f64,
    pub mean_turnaround_time: f64,
    pub mean_wait_time: f64,
    pub by_priority: [PriorityClassStats; 4],
}

pub fn thread_metrics(ctx: &Workload) -> Vec<ThreadMetrics> {
    ctx.thread_keys()
        .map(|key| ThreadMetrics::from_thread(ctx.thread(key)))
        .collect()
}

pub fn calculate_statistics(ctx: &Workload, total_time: Ticks, dispatch_time: Ticks) -> SystemStats {
    let metrics = thread_metrics(ctx);
    let completed = ctx
        .threads
        .values()
        .filter(|t| t.state == ThreadState::Exit)
        .count();

    let service_time: Ticks = metrics.iter().map(|m| m.service_time).sum();
    // IO overlaps across threads, so the total can exceed the clock
    let io_time = metrics
        .iter()
        .fold(0 as Ticks, |sum, m| sum.saturating_add(m.io_time));

    let mut by_priority: [PriorityClassStats; 4] = Default::default();
    for priority in ProcessPriority::ALL {
        let class: Vec<&ThreadMetrics> = metrics.iter().filter(|m| m.priority == priority).collect();
        by_priority[priority.level()] = PriorityClassStats {
            thread_count: class.len(),
            mean_response_time: mean(class.iter().filter_map(|m| m.response_time)),
            mean_turnaround_time: mean(class.iter().filter_map(|m| m.turnaround_time)),
        };
    }

    SystemStats {
        total_time,
        service_time,
        io_time,
        dispatch_time,
        idle_time: total_time.saturating_sub(service_time + dispatch_time),
        cpu_utilization: ratio(service_time as f64, total_time),
        dispatcher_utilization: ratio(dispatch_time as f64, total_time),
        throughput: ratio(completed as f64, total_time),
        thread_count: metrics.len(),
        completed_threads: completed,
        mean_response_time: mean(metrics.iter().filter_map(|m| m.response_time)),
        mean_turnaround_time: mean(metrics.iter().filter_map(|m| m.turnaround_time)),
        mean_wait_time: mean(metrics.iter().filter_map(|m| m.wait_time)),
        by_priority,
    }
}

fn ratio(value: f64, total_time: Ticks) -> f64 {
    if total_time == 0 {
        0.0
    } else {
        value / total_time as f64
    }
}

fn mean(samples: impl Iterator<Item = Ticks>) -> f64 {
    let mean: Mean = samples.map(|s| s as f64).collect();
    if mean.is_empty() { 0.0 } else { mean.estimate() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(w: &mut Workload, process: u32, arrival: Ticks, bursts: &[Ticks], start: Ticks, end: Ticks) {
        let key = w.add_thread(process, arrival, bursts).unwrap();
        let t = w.thread_mut(key);
        t.set_state(ThreadState::Ready, arrival).unwrap();
        t.set_state(ThreadState::Running, start).unwrap();
        t.set_state(ThreadState::Exit, end).unwrap();
        t.service_time = t.cpu_demand();
        t.bursts.clear();
    }

    #[test]
    fn empty_workload_reports_zeroes() {
        let stats = calculate_statistics(&Workload::new(0), 0, 0);
        assert_eq!(stats, SystemStats::default());
    }

    #[test]
    fn aggregates_means_and_utilization() {
        let mut w = Workload::new(1);
        w.add_process(0, ProcessPriority::System).unwrap();
        w.add_process(1, ProcessPriority::Batch).unwrap();
        finished(&mut w, 0, 0, &[4], 1, 5);
        finished(&mut w, 1, 2, &[2, 3, 2], 6, 20);

        let stats = calculate_statistics(&w, 20, 2);
        assert_eq!(stats.service_time, 8);
        assert_eq!(stats.idle_time, 10);
        assert_eq!(stats.cpu_utilization, 0.4);
        assert_eq!(stats.dispatcher_utilization, 0.1);
        assert_eq!(stats.throughput, 0.1);
        assert_eq!(stats.completed_threads, 2);
        // responses 1 and 4, turnarounds 5 and 18, waits 1 and 14
        assert_eq!(stats.mean_response_time, 2.5);
        assert_eq!(stats.mean_turnaround_time, 11.5);
        assert_eq!(stats.mean_wait_time, 7.5);

        let batch = &stats.by_priority[ProcessPriority::Batch.level()];
        assert_eq!(batch.thread_count, 1);
        assert_eq!(batch.mean_turnaround_time, 18.0);
        assert_eq!(stats.by_priority[ProcessPriority::Normal.level()].thread_count, 0);
    }

    #[test]
    fn unfinished_threads_have_no_turnaround() {
        let mut w = Workload::new(0);
        w.add_process(0, ProcessPriority::Normal).unwrap();
        let key = w.add_thread(0, 3, &[2]).unwrap();

        let m = ThreadMetrics::from_thread(w.thread(key));
        assert_eq!(m.response_time, None);
        assert_eq!(m.wait_time, None);
        assert_eq!(calculate_statistics(&w, 0, 0).completed_threads, 0);
    }
}
