//! Tick-driven simulation engine
//!
//! One call to [`Simulation::tick`] is one time unit and always runs the same
//! steps in the same order:
//!
//! 1. Admission: processes waiting for memory are retried, then the arrivals
//!    of this tick are admitted if a partition fits them. An admitted process
//!    that outranks the running one preempts it immediately.
//! 2. Dispatch: if the core is idle the scheduler picks the next process.
//! 3. I/O aging: every waiting process loses one unit of I/O time.
//! 4. Execution: the running process runs for one unit and may terminate,
//!    use up its quantum or issue an I/O request.
//! 5. The clock advances.
//! 6. Transitions from steps 3 and 4 are logged with the advanced clock.
//!
//! Transitions from steps 1 and 2 are logged with the clock of the tick they
//! happen in.
use std::collections::{BTreeSet, VecDeque};

use log::{debug, error, info, warn};

use crate::{
    config::SimulatorConfig,
    core::{Core, ProcessResult},
    error::Result,
    log::{Anomaly, SimulationLog},
    memory::MemoryAllocator,
    process::{JobRegistry, Pid, ProcessDescriptor, ProcessState},
    scheduler::{create_scheduler, SchedulerBase},
};

type PendingTransition = (Pid, ProcessState, ProcessState);

pub struct Simulation {
    scheduler: Box<dyn SchedulerBase>,
    allocator: MemoryAllocator,
    registry: JobRegistry,
    core: Core,
    ready_queue: VecDeque<Pid>,
    wait_queue: Vec<Pid>,
    /// Arrived processes still NEW because no free partition fits them.
    memory_queue: VecDeque<Pid>,
    unschedulable: BTreeSet<Pid>,
    current_time: u32,
    busy_time: u32,
    need_reschedule: bool,
    log: SimulationLog,
}

impl Simulation {
    pub fn new(process_set: &[ProcessDescriptor], config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;
        let allocator = MemoryAllocator::new(&config.partitions, config.placement);
        Self::with_scheduler(process_set, allocator, create_scheduler(config))
    }

    pub fn with_scheduler(
        process_set: &[ProcessDescriptor],
        allocator: MemoryAllocator,
        scheduler: Box<dyn SchedulerBase>,
    ) -> Result<Self> {
        Ok(Self {
            scheduler,
            allocator,
            registry: JobRegistry::new(process_set)?,
            core: Core::default(),
            ready_queue: VecDeque::new(),
            wait_queue: Vec::new(),
            memory_queue: VecDeque::new(),
            unschedulable: BTreeSet::new(),
            current_time: 0,
            busy_time: 0,
            need_reschedule: false,
            log: SimulationLog::default(),
        })
    }

    pub fn current_time(&self) -> u32 {
        self.current_time
    }

    /// Ticks in which the core executed a process.
    pub fn busy_time(&self) -> u32 {
        self.busy_time
    }

    pub fn running(&self) -> Option<Pid> {
        self.core.processing_pid
    }

    pub fn ready_queue(&self) -> &VecDeque<Pid> {
        &self.ready_queue
    }

    pub fn wait_queue(&self) -> &[Pid] {
        &self.wait_queue
    }

    pub fn memory_queue(&self) -> &VecDeque<Pid> {
        &self.memory_queue
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn allocator(&self) -> &MemoryAllocator {
        &self.allocator
    }

    pub fn log(&self) -> &SimulationLog {
        &self.log
    }

    pub fn into_log(self) -> SimulationLog {
        self.log
    }

    pub fn scheduler_name(&self) -> &'static str {
        self.scheduler.name()
    }

    /// Every process has terminated or was found unschedulable.
    pub fn is_finished(&self) -> bool {
        self.registry
            .iter()
            .all(|record| record.is_terminated() || self.unschedulable.contains(&record.pid()))
    }

    /// Run until every process is finished and return the final clock value.
    pub fn run(&mut self) -> u32 {
        info!(
            "Simulating {} processes with {} on {} partitions",
            self.registry.len(),
            self.scheduler.name(),
            self.allocator.partitions().len()
        );
        while !self.is_finished() {
            if self.is_livelocked() {
                self.resolve_livelock();
                break;
            }
            self.tick();
        }
        info!(
            "Simulation finished at t={} ({} busy ticks, {} unschedulable)",
            self.current_time,
            self.busy_time,
            self.unschedulable.len()
        );
        self.current_time
    }

    pub fn tick(&mut self) {
        self.admit_processes();

        if self.core.is_idle() || self.need_reschedule {
            self.need_reschedule = false;
            self.dispatch();
        }

        let mut pending = self.age_io();
        pending.extend(self.execute());

        self.current_time += 1;

        if !pending.is_empty() {
            for (pid, old_state, new_state) in pending {
                self.log
                    .write_transition(self.current_time, pid, old_state, new_state);
            }
            self.write_memory_snapshot();
        }
    }

    fn admit_processes(&mut self) {
        // pids stay queued until admitted so snapshots still see them
        for pid in self.memory_queue.clone() {
            if self.try_admit(pid) {
                self.memory_queue.retain(|&queued| queued != pid);
            }
        }

        for pid in self.registry.arrivals_at(self.current_time) {
            let size = self.registry[pid].size();
            if !self.allocator.can_ever_fit(size) {
                let largest_partition = self.allocator.largest_partition();
                warn!(
                    "Process {} needs {}MB but the largest partition is {}MB; it is unschedulable",
                    pid, size, largest_partition
                );
                self.unschedulable.insert(pid);
                self.log.write_anomaly(Anomaly::Unschedulable {
                    time: self.current_time,
                    pid,
                    size,
                    largest_partition,
                });
                continue;
            }
            if !self.try_admit(pid) {
                info!(
                    "Process {} arrived at t={} and waits for a free partition of {}MB or more",
                    pid, self.current_time, size
                );
                self.memory_queue.push_back(pid);
            }
        }
    }

    /// NEW -> READY if a partition is free for the process.
    fn try_admit(&mut self, pid: Pid) -> bool {
        let record = &mut self.registry[pid];
        if !self.allocator.assign_memory(record) {
            return false;
        }
        record.state = ProcessState::Ready;
        self.ready_queue.push_back(pid);
        self.log.write_transition(
            self.current_time,
            pid,
            ProcessState::New,
            ProcessState::Ready,
        );
        self.write_memory_snapshot();

        if let Some(running) = self.core.processing_pid {
            if self.scheduler.should_preempt(pid, running) {
                self.core.release();
                self.registry[running].state = ProcessState::Ready;
                self.ready_queue.push_back(running);
                self.log.write_transition(
                    self.current_time,
                    running,
                    ProcessState::Running,
                    ProcessState::Ready,
                );
                self.need_reschedule = true;
                debug!(
                    "t={}: process {} preempts process {}",
                    self.current_time, pid, running
                );
            }
        }
        true
    }

    fn dispatch(&mut self) {
        let Some(pid) = self.scheduler.select_next(&mut self.ready_queue) else {
            return;
        };
        let record = &mut self.registry[pid];
        if !self.core.allocate(record, self.current_time) {
            self.ready_queue.push_front(pid);
            return;
        }
        record.state = ProcessState::Running;
        self.log.write_transition(
            self.current_time,
            pid,
            ProcessState::Ready,
            ProcessState::Running,
        );
        self.write_memory_snapshot();
    }

    fn age_io(&mut self) -> Vec<PendingTransition> {
        let mut completed = Vec::new();
        for &pid in &self.wait_queue {
            let record = &mut self.registry[pid];
            record.io_remaining_time = record.io_remaining_time.saturating_sub(1);
            if record.io_remaining_time == 0 {
                completed.push(pid);
            }
        }
        self.wait_queue.retain(|pid| !completed.contains(pid));

        completed
            .into_iter()
            .map(|pid| {
                let record = &mut self.registry[pid];
                record.state = ProcessState::Ready;
                record.quantum_used = 0;
                self.ready_queue.push_back(pid);
                (pid, ProcessState::Waiting, ProcessState::Ready)
            })
            .collect()
    }

    fn execute(&mut self) -> Option<PendingTransition> {
        let pid = self.core.processing_pid?;
        let time_quantum = self.scheduler.time_quantum();
        let record = &mut self.registry[pid];
        let result = self.core.process(record, time_quantum, self.current_time);
        self.busy_time += 1;

        match result {
            ProcessResult::Done(pid) => {
                record.state = ProcessState::Terminated;
                self.allocator.free_memory(record);
                debug!("t={}: process {} terminated", self.current_time + 1, pid);
                Some((pid, ProcessState::Running, ProcessState::Terminated))
            }
            ProcessResult::QuantumExpired(pid) => {
                record.state = ProcessState::Ready;
                self.ready_queue.push_back(pid);
                Some((pid, ProcessState::Running, ProcessState::Ready))
            }
            ProcessResult::IoRequest(pid) => {
                record.state = ProcessState::Waiting;
                record.io_remaining_time = record.io_duration();
                self.wait_queue.push(pid);
                Some((pid, ProcessState::Running, ProcessState::Waiting))
            }
            ProcessResult::Idle | ProcessResult::Continue => None,
        }
    }

    fn smallest_unassigned(&self) -> Option<u32> {
        self.memory_queue
            .iter()
            .chain(self.ready_queue.iter())
            .map(|&pid| &self.registry[pid])
            .filter(|record| record.partition().is_none())
            .map(|record| record.size())
            .min()
    }

    fn write_memory_snapshot(&mut self) {
        let snapshot = self.allocator.memory_snapshot(
            self.current_time,
            self.core.processing_pid,
            self.ready_queue.len(),
            self.wait_queue.len(),
            self.smallest_unassigned(),
        );
        self.log.write_memory_snapshot(snapshot);
    }

    /// Nothing is running or queued and no arrival is ahead, so no later tick
    /// can change anything.
    fn is_livelocked(&self) -> bool {
        self.core.is_idle()
            && self.ready_queue.is_empty()
            && self.wait_queue.is_empty()
            && self.memory_queue.is_empty()
            && !self.registry.has_arrivals_from(self.current_time)
    }

    fn resolve_livelock(&mut self) {
        let stuck = self
            .registry
            .iter()
            .filter(|record| !record.is_terminated() && !self.unschedulable.contains(&record.pid()))
            .map(|record| (record.pid(), record.remaining_time()))
            .collect::<Vec<(Pid, u32)>>();
        error!(
            "t={}: no progress possible, force-terminating processes {:?}",
            self.current_time,
            stuck.iter().map(|(pid, _)| pid).collect::<Vec<_>>()
        );

        for &(pid, _) in &stuck {
            let record = &mut self.registry[pid];
            let old_state = record.state();
            record.state = ProcessState::Terminated;
            self.allocator.free_memory(record);
            self.log.write_transition(
                self.current_time,
                pid,
                old_state,
                ProcessState::Terminated,
            );
        }
        self.log.write_anomaly(Anomaly::Livelock {
            time: self.current_time,
            pids: stuck.iter().map(|&(pid, _)| pid).collect(),
            remaining_times: stuck.iter().map(|&(_, remaining)| remaining).collect(),
        });
        self.write_memory_snapshot();
    }
}
