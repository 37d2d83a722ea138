//! Reader and writer for the whitespace-separated workload format.
//!
//! ```text
//! num_processes thread_switch_overhead process_switch_overhead
//! process_id priority num_threads          (per process)
//! arrival_time num_cpu_bursts              (per thread)
//! cpu io cpu ... cpu                       (2 * num_cpu_bursts - 1 lengths)
//! ```

use std::{fmt::Write as _, fs, path::Path, str::SplitWhitespace};

use tracing::{debug, warn};

use crate::{
    core::state::{ProcessId, ProcessPriority, Ticks, Workload},
    error::{LoadError, WorkloadError},
};

struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            inner: input.split_whitespace(),
        }
    }

    fn int(&mut self, field: &'static str) -> Result<i64, LoadError> {
        let token = self
            .inner
            .next()
            .ok_or(LoadError::UnexpectedEof { field })?;
        token.parse().map_err(|_| LoadError::InvalidInteger {
            field,
            token: token.to_owned(),
        })
    }

    fn non_negative(&mut self, field: &'static str) -> Result<u64, LoadError> {
        let value = self.int(field)?;
        u64::try_from(value).map_err(|_| LoadError::Negative { field, value })
    }
}

pub fn load_workload(path: impl AsRef<Path>) -> Result<Workload, LoadError> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_workload(&input)
}

pub fn parse_workload(input: &str) -> Result<Workload, LoadError> {
    let mut tokens = Tokens::new(input);

    let num_processes = tokens.non_negative("num_processes")?;
    let thread_switch_overhead = tokens.non_negative("thread_switch_overhead")?;
    let process_switch_overhead = tokens.non_negative("process_switch_overhead")?;
    if thread_switch_overhead != 0 {
        warn!(thread_switch_overhead, "thread switch overhead is ignored");
    }

    let mut workload = Workload::new(process_switch_overhead);
    workload.thread_switch_overhead = thread_switch_overhead;

    for _ in 0..num_processes {
        let process_id = tokens.non_negative("process_id")?;
        let process_id = ProcessId::try_from(process_id).map_err(|_| LoadError::InvalidInteger {
            field: "process_id",
            token: process_id.to_string(),
        })?;
        let level = tokens.int("priority")?;
        let priority = ProcessPriority::from_level(level).ok_or(LoadError::InvalidPriority(level))?;
        let num_threads = tokens.non_negative("num_threads")?;
        workload.add_process(process_id, priority)?;

        for _ in 0..num_threads {
            let arrival_time = tokens.non_negative("arrival_time")?;
            let num_cpu_bursts = tokens.non_negative("num_cpu_bursts")?;
            if num_cpu_bursts == 0 {
                return Err(WorkloadError::MalformedBursts { count: 0 }.into());
            }

            let bursts = (0..num_cpu_bursts * 2 - 1)
                .map(|_| tokens.non_negative("burst_length"))
                .collect::<Result<Vec<Ticks>, _>>()?;
            workload.add_thread(process_id, arrival_time, &bursts)?;
        }
    }

    debug!(
        processes = workload.processes.len(),
        threads = workload.thread_count(),
        dispatch_overhead = workload.dispatch_overhead,
        "workload loaded"
    );
    Ok(workload)
}

/// Renders a workload in the format accepted by [`parse_workload`], using
/// the original burst lengths.
pub fn write_workload(workload: &Workload) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {}",
        workload.processes.len(),
        workload.thread_switch_overhead,
        workload.dispatch_overhead
    );

    for process in &workload.processes {
        let _ = writeln!(
            out,
            "\n{} {} {}",
            process.id,
            process.priority.level(),
            process.threads.len()
        );
        for &key in &process.threads {
            let thread = workload.thread(key);
            let cpu_bursts = thread.burst_lengths().len().div_ceil(2);
            let lengths: Vec<String> = thread
                .burst_lengths()
                .iter()
                .map(|len| len.to_string())
                .collect();
            let _ = writeln!(out, "{} {}", thread.arrival_time, cpu_bursts);
            let _ = writeln!(out, "{}", lengths.join(" "));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::BurstKind;

    const SAMPLE: &str = "2 0 3
        0 1 2
        0 2
        4 5 6
        10 1
        3
        7 3 1
        2 1
        8";

    #[test]
    fn parses_processes_threads_and_bursts() {
        let w = parse_workload(SAMPLE).unwrap();
        assert_eq!(w.dispatch_overhead, 3);
        assert_eq!(w.processes.len(), 2);

        let p0 = w.process(0).unwrap();
        assert_eq!(p0.priority, ProcessPriority::Interactive);
        assert_eq!(p0.threads.len(), 2);

        let t = w.thread(p0.threads[0]);
        let bursts: Vec<_> = t.bursts.iter().map(|b| (b.kind, b.length)).collect();
        assert_eq!(
            bursts,
            vec![(BurstKind::Cpu, 4), (BurstKind::Io, 5), (BurstKind::Cpu, 6)]
        );
        assert_eq!(w.thread(p0.threads[1]).arrival_time, 10);
        assert_eq!(w.process(7).unwrap().priority, ProcessPriority::Batch);
    }

    #[test]
    fn written_workload_parses_back() {
        let w = parse_workload(SAMPLE).unwrap();
        let again = parse_workload(&write_workload(&w)).unwrap();
        assert_eq!(write_workload(&again), write_workload(&w));
    }

    #[test]
    fn writing_after_a_run_keeps_declared_bursts() {
        let before = write_workload(&parse_workload(SAMPLE).unwrap());
        let sim = crate::simulate(parse_workload(SAMPLE).unwrap(), crate::Policy::RoundRobin, 2)
            .unwrap();

        assert!(sim.ctx.threads.values().all(|t| t.bursts.is_empty()));
        assert_eq!(write_workload(&sim.ctx), before);
    }

    #[test]
    fn truncated_input_names_missing_field() {
        let err = parse_workload("1 0 2\n0 1 1\n0 2\n4 5").unwrap_err();
        assert!(matches!(err, LoadError::UnexpectedEof { field: "burst_length" }), "{err}");
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(matches!(
            parse_workload("1 0 x").unwrap_err(),
            LoadError::InvalidInteger { field: "process_switch_overhead", .. }
        ));
        assert!(matches!(
            parse_workload("1 0 0\n0 9 1\n0 1 1").unwrap_err(),
            LoadError::InvalidPriority(9)
        ));
        assert!(matches!(
            parse_workload("1 0 0\n0 1 1\n-2 1 1").unwrap_err(),
            LoadError::Negative { field: "arrival_time", value: -2 }
        ));
        assert!(matches!(
            parse_workload("2 0 0\n0 1 0\n0 1 0").unwrap_err(),
            LoadError::Workload(_)
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_workload("/nonexistent/workload.txt").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/workload.txt"));
    }
}
