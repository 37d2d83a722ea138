use rand::prelude::*;

use crate::{
    core::state::{ProcessPriority, Ticks, Workload},
    error::WorkloadError,
};

/// Parameters for a seeded random workload. All maxima are inclusive.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub processes: u32,
    pub max_threads_per_process: usize,
    pub max_cpu_bursts: usize,
    pub max_burst_length: Ticks,
    pub max_arrival_time: Ticks,
    pub dispatch_overhead: Ticks,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            processes: 4,
            max_threads_per_process: 3,
            max_cpu_bursts: 4,
            max_burst_length: 10,
            max_arrival_time: 20,
            dispatch_overhead: 1,
        }
    }
}

pub fn random_workload(config: &GeneratorConfig) -> Result<Workload, WorkloadError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut workload = Workload::new(config.dispatch_overhead);

    for process_id in 0..config.processes {
        let priority = ProcessPriority::ALL[rng.random_range(0..ProcessPriority::ALL.len())];
        workload.add_process(process_id, priority)?;

        let threads = rng.random_range(1..=config.max_threads_per_process.max(1));
        for _ in 0..threads {
            let arrival = rng.random_range(0..=config.max_arrival_time);
            let cpu_bursts = rng.random_range(1..=config.max_cpu_bursts.max(1));
            let bursts: Vec<Ticks> = (0..cpu_bursts * 2 - 1)
                .map(|_| rng.random_range(1..=config.max_burst_length.max(1)))
                .collect();
            workload.add_thread(process_id, arrival, &bursts)?;
        }
    }

    Ok(workload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::parse::write_workload;

    #[test]
    fn same_seed_same_workload() {
        let config = GeneratorConfig {
            seed: 42,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            write_workload(&random_workload(&config).unwrap()),
            write_workload(&random_workload(&config).unwrap())
        );
    }

    #[test]
    fn respects_bounds() {
        let config = GeneratorConfig {
            seed: 7,
            processes: 6,
            max_threads_per_process: 2,
            max_cpu_bursts: 3,
            max_burst_length: 5,
            max_arrival_time: 9,
            dispatch_overhead: 2,
        };
        let w = random_workload(&config).unwrap();

        assert_eq!(w.processes.len(), 6);
        assert_eq!(w.dispatch_overhead, 2);
        for p in &w.processes {
            assert!((1..=2).contains(&p.threads.len()));
        }
        for t in w.threads.values() {
            assert!(t.arrival_time <= 9);
            assert!(t.bursts.len() % 2 == 1 && t.bursts.len() <= 5);
            assert!(t.bursts.iter().all(|b| (1..=5).contains(&b.length)));
        }
    }
}
