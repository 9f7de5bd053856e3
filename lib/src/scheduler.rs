//! External-priority schedulers
//!
//! Rank is the pid: the lower the pid, the higher the priority. The ready
//! queue is re-sorted by rank before every dispatch, so insertion order never
//! decides who runs next. With the round-robin variant the quantum only bounds
//! how long one burst may hold the CPU; a process whose quantum expires goes
//! straight back to the front if nothing outranks it, so equal-rank rotation
//! (as in classic round robin) does not happen.
use std::collections::VecDeque;

use crate::{
    config::{SchedulingPolicy, SimulatorConfig},
    process::Pid,
};

pub trait SchedulerBase {
    fn name(&self) -> &'static str;

    /// Maximum consecutive ticks per dispatch, `None` for run-to-block.
    fn time_quantum(&self) -> Option<u32>;

    /// Whether an arriving process takes the CPU from the running one.
    fn should_preempt(&self, arriving: Pid, running: Pid) -> bool;

    fn sort_ready_queue(&self, ready_queue: &mut VecDeque<Pid>) {
        ready_queue.make_contiguous().sort();
    }

    fn select_next(&self, ready_queue: &mut VecDeque<Pid>) -> Option<Pid> {
        self.sort_ready_queue(ready_queue);
        ready_queue.pop_front()
    }
}

/// Non-preemptive external priorities: a dispatched process keeps the CPU
/// until it terminates or blocks on I/O.
#[derive(Clone, Default)]
pub struct ExternalPriorities;

impl SchedulerBase for ExternalPriorities {
    fn name(&self) -> &'static str {
        SchedulingPolicy::ExternalPriorities.name()
    }

    fn time_quantum(&self) -> Option<u32> {
        None
    }

    fn should_preempt(&self, _arriving: Pid, _running: Pid) -> bool {
        false
    }
}

/// External priorities with preemption on arrival and a round-robin quantum.
#[derive(Clone)]
pub struct ExternalPrioritiesRoundRobin {
    pub time_quantum: u32,
}

impl ExternalPrioritiesRoundRobin {
    pub fn new(time_quantum: u32) -> Self {
        Self { time_quantum }
    }
}

impl SchedulerBase for ExternalPrioritiesRoundRobin {
    fn name(&self) -> &'static str {
        SchedulingPolicy::ExternalPrioritiesRoundRobin.name()
    }

    fn time_quantum(&self) -> Option<u32> {
        Some(self.time_quantum)
    }

    fn should_preempt(&self, arriving: Pid, running: Pid) -> bool {
        arriving < running
    }
}

pub fn create_scheduler(config: &SimulatorConfig) -> Box<dyn SchedulerBase> {
    match config.policy {
        SchedulingPolicy::ExternalPriorities => Box::new(ExternalPriorities),
        SchedulingPolicy::ExternalPrioritiesRoundRobin => {
            Box::new(ExternalPrioritiesRoundRobin::new(config.time_quantum))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_next_lowest_pid_first() {
        let scheduler = ExternalPrioritiesRoundRobin::new(100);
        let mut ready_queue = VecDeque::from(vec![7, 3, 9, 1]);
        assert_eq!(scheduler.select_next(&mut ready_queue), Some(1));
        assert_eq!(ready_queue, VecDeque::from(vec![3, 7, 9]));
    }

    #[test]
    fn test_select_next_empty() {
        let scheduler = ExternalPriorities;
        let mut ready_queue = VecDeque::new();
        assert_eq!(scheduler.select_next(&mut ready_queue), None);
    }

    #[test]
    fn test_select_next_ignores_insertion_order() {
        // a process pushed to the back after its quantum expired is still
        // picked first when it has the lowest pid
        let scheduler = ExternalPrioritiesRoundRobin::new(3);
        let mut ready_queue = VecDeque::from(vec![4, 2]);
        ready_queue.push_back(1);
        assert_eq!(scheduler.select_next(&mut ready_queue), Some(1));
    }

    #[test]
    fn test_should_preempt_round_robin() {
        let scheduler = ExternalPrioritiesRoundRobin::new(100);
        assert!(scheduler.should_preempt(1, 5));
        assert!(!scheduler.should_preempt(5, 1));
        assert_eq!(scheduler.time_quantum(), Some(100));
    }

    #[test]
    fn test_should_preempt_non_preemptive() {
        let scheduler = ExternalPriorities;
        assert!(!scheduler.should_preempt(1, 5));
        assert_eq!(scheduler.time_quantum(), None);
    }

    #[test]
    fn test_create_scheduler_from_config() {
        let mut config = SimulatorConfig {
            time_quantum: 7,
            ..Default::default()
        };
        let scheduler = create_scheduler(&config);
        assert_eq!(scheduler.name(), "external_priorities_round_robin");
        assert_eq!(scheduler.time_quantum(), Some(7));

        config.policy = SchedulingPolicy::ExternalPriorities;
        assert_eq!(create_scheduler(&config).name(), "external_priorities");
    }
}
