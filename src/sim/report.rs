//! Text rendering of transitions and metrics for the command line.

use std::fmt::Write as _;

use crate::core::{
    event::StateTransition,
    state::{ProcessPriority, Workload},
    stats::{SystemStats, ThreadMetrics},
};

pub fn format_transition(tr: &StateTransition) -> String {
    let mut out = format!(
        "At time {}:\n    {}\n    {}\n    Transitioned from {} to {}\n",
        tr.time, tr.event, tr.thread, tr.from, tr.to
    );
    if let Some(explanation) = &tr.explanation {
        let _ = writeln!(out, "\n    {explanation}");
    }
    out
}

fn opt(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_owned(), |v| v.to_string())
}

/// Per-thread table grouped by process in declaration order.
pub fn format_thread_metrics(ctx: &Workload, metrics: &[ThreadMetrics]) -> String {
    let mut out = String::new();
    for process in &ctx.processes {
        let _ = writeln!(out, "Process {} [{}]:", process.id, process.priority);
        for m in metrics.iter().filter(|m| m.thread.process == process.id) {
            let _ = writeln!(
                out,
                "    Thread {}:  ARR: {:<6} CPU: {:<6} I/O: {:<6} TRT: {:<6} END: {:<6} RSP: {:<6} WAIT: {}",
                m.thread.thread,
                m.arrival_time,
                m.service_time,
                m.io_time,
                opt(m.turnaround_time),
                opt(m.end_time),
                opt(m.response_time),
                opt(m.wait_time),
            );
        }
        out.push('\n');
    }
    out
}

pub fn format_system_stats(stats: &SystemStats) -> String {
    let mut out = String::from("SIMULATION COMPLETED!\n\n");
    for priority in ProcessPriority::ALL {
        let class = &stats.by_priority[priority.level()];
        let _ = writeln!(out, "{priority} THREADS:");
        let _ = writeln!(out, "    Total count:                {:>8}", class.thread_count);
        let _ = writeln!(out, "    Avg. response time:         {:>8.2}", class.mean_response_time);
        let _ = writeln!(out, "    Avg. turnaround time:       {:>8.2}\n", class.mean_turnaround_time);
    }

    let _ = writeln!(out, "Total elapsed time:             {:>8}", stats.total_time);
    let _ = writeln!(out, "Total service time:             {:>8}", stats.service_time);
    let _ = writeln!(out, "Total I/O time:                 {:>8}", stats.io_time);
    let _ = writeln!(out, "Total dispatch time:            {:>8}", stats.dispatch_time);
    let _ = writeln!(out, "Total idle time:                {:>8}\n", stats.idle_time);
    let _ = writeln!(
        out,
        "Threads completed:              {:>5}/{}",
        stats.completed_threads, stats.thread_count
    );
    let _ = writeln!(out, "Avg. response time:             {:>8.2}", stats.mean_response_time);
    let _ = writeln!(out, "Avg. turnaround time:           {:>8.2}", stats.mean_turnaround_time);
    let _ = writeln!(out, "Avg. wait time:                 {:>8.2}", stats.mean_wait_time);
    let _ = writeln!(out, "Throughput:                     {:>8.4}", stats.throughput);
    let _ = writeln!(out, "CPU utilization:                {:>7.2}%", stats.cpu_utilization * 100.0);
    let _ = writeln!(
        out,
        "Dispatcher utilization:         {:>7.2}%",
        stats.dispatcher_utilization * 100.0
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventKind, ThreadRef, ThreadState};

    #[test]
    fn transition_lines_name_thread_and_states() {
        let tr = StateTransition {
            time: 4,
            event: EventKind::DispatchCompleted,
            thread: ThreadRef { process: 2, thread: 1 },
            from: ThreadState::Ready,
            to: ThreadState::Running,
            explanation: Some("Selected from 3 threads.".into()),
        };
        let text = format_transition(&tr);
        assert!(text.starts_with("At time 4:"));
        assert!(text.contains("DISPATCH_COMPLETED"));
        assert!(text.contains("thread 1 of process 2"));
        assert!(text.contains("READY to RUNNING"));
        assert!(text.contains("Selected from 3 threads."));
    }

    #[test]
    fn system_stats_include_every_priority_class() {
        let text = format_system_stats(&SystemStats {
            cpu_utilization: 0.5,
            ..SystemStats::default()
        });
        for p in ProcessPriority::ALL {
            assert!(text.contains(&format!("{p} THREADS:")));
        }
        assert!(text.contains("50.00%"));
    }
}
