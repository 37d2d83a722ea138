use burstsim::{
    Policy, Simulation, StateTransition, Workload,
    core::{EventKind, ProcessPriority, ThreadState},
    scheduler::UNBOUNDED_SLICE,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct ThreadSpec {
    process: u32,
    arrival: u64,
    bursts: Vec<u64>,
}

fn thread_spec() -> impl Strategy<Value = ThreadSpec> {
    (0u32..3, 0u64..30, 1usize..4).prop_flat_map(|(process, arrival, cpu_bursts)| {
        proptest::collection::vec(0u64..12, cpu_bursts * 2 - 1).prop_map(move |bursts| ThreadSpec {
            process,
            arrival,
            bursts,
        })
    })
}

fn policy() -> impl Strategy<Value = (Policy, i64)> {
    prop_oneof![
        Just((Policy::Fcfs, UNBOUNDED_SLICE)),
        Just((Policy::Priority, UNBOUNDED_SLICE)),
        (1i64..7).prop_map(|q| (Policy::RoundRobin, q)),
    ]
}

fn build(specs: &[ThreadSpec], overhead: u64) -> Workload {
    let mut w = Workload::new(overhead);
    for (id, priority) in ProcessPriority::ALL.iter().take(3).enumerate() {
        w.add_process(id as u32, *priority).unwrap();
    }
    for spec in specs {
        w.add_thread(spec.process, spec.arrival, &spec.bursts).unwrap();
    }
    w
}

fn simulate(specs: &[ThreadSpec], overhead: u64, (policy, slice): (Policy, i64)) -> Simulation<Box<dyn burstsim::Scheduler>> {
    let mut sim = Simulation::new(build(specs, overhead), policy.build(slice).unwrap());
    sim.run().unwrap();
    sim
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn every_thread_exits_and_cpu_work_is_conserved(
        specs in proptest::collection::vec(thread_spec(), 0..8),
        overhead in 0u64..3,
        policy in policy(),
    ) {
        let sim = simulate(&specs, overhead, policy);

        for t in sim.ctx.threads.values() {
            prop_assert_eq!(t.state, ThreadState::Exit);
            prop_assert!(t.end_time.unwrap() >= t.arrival_time);
            prop_assert!(t.start_time.unwrap() >= t.arrival_time);
            prop_assert_eq!(t.service_time, t.cpu_demand());
        }

        let demand: u64 = specs
            .iter()
            .flat_map(|s| s.bursts.iter().step_by(2))
            .sum();
        let stats = sim.calculate_statistics();
        prop_assert_eq!(stats.service_time, demand);
        prop_assert!(stats.service_time + stats.dispatch_time <= stats.total_time);
        prop_assert_eq!(stats.completed_threads, specs.len());
    }

    #[test]
    fn reruns_produce_identical_transitions(
        specs in proptest::collection::vec(thread_spec(), 1..8),
        overhead in 0u64..3,
        policy in policy(),
    ) {
        let a: Vec<StateTransition> = simulate(&specs, overhead, policy).transitions().to_vec();
        let b: Vec<StateTransition> = simulate(&specs, overhead, policy).transitions().to_vec();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn transitions_are_time_ordered(
        specs in proptest::collection::vec(thread_spec(), 1..8),
        policy in policy(),
    ) {
        let sim = simulate(&specs, 1, policy);
        let times: Vec<u64> = sim.transitions().iter().map(|t| t.time).collect();
        prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn statistics_are_idempotent(
        specs in proptest::collection::vec(thread_spec(), 0..6),
        policy in policy(),
    ) {
        let sim = simulate(&specs, 1, policy);
        prop_assert_eq!(sim.calculate_statistics(), sim.calculate_statistics());
        prop_assert_eq!(sim.thread_metrics(), sim.thread_metrics());
    }

    #[test]
    fn fcfs_dispatches_in_ready_order(
        specs in proptest::collection::vec(thread_spec(), 1..8),
        overhead in 0u64..3,
    ) {
        let sim = simulate(&specs, overhead, (Policy::Fcfs, UNBOUNDED_SLICE));

        // Replay ready-queue entries and check each dispatch takes the head.
        let mut queue = std::collections::VecDeque::new();
        for tr in sim.transitions() {
            match tr.to {
                ThreadState::Ready => queue.push_back(tr.thread),
                ThreadState::Running => prop_assert_eq!(queue.pop_front(), Some(tr.thread)),
                _ => {}
            }
        }
        prop_assert!(sim.transitions().iter().all(|t| t.event != EventKind::ProcessPreempted));
    }

    #[test]
    fn round_robin_preempts_after_exactly_one_quantum(
        specs in proptest::collection::vec(thread_spec(), 1..6),
        quantum in 1u64..6,
    ) {
        let sim = simulate(&specs, 0, (Policy::RoundRobin, quantum as i64));

        let mut started = std::collections::HashMap::new();
        for tr in sim.transitions() {
            if tr.to == ThreadState::Running {
                started.insert(tr.thread, tr.time);
            } else if tr.from == ThreadState::Running {
                let ran = tr.time - started[&tr.thread];
                if tr.event == EventKind::ProcessPreempted {
                    prop_assert_eq!(ran, quantum);
                } else {
                    prop_assert!(ran <= quantum);
                }
            }
        }
    }
}
