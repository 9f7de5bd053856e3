//! Process records (PCBs) and the job registry that owns them
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use getset::CopyGetters;
use serde_derive::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Process id. Lower ids have higher priority.
pub type Pid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    New,
    Ready,
    Running,
    Waiting,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Running => "RUNNING",
            ProcessState::Waiting => "WAITING",
            ProcessState::Terminated => "TERMINATED",
        };
        write!(f, "{}", name)
    }
}

/// Static description of a process as read from the input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub pid: Pid,
    pub size: u32,
    pub arrival_time: u32,
    pub cpu_time: u32,
    pub io_frequency: u32,
    pub io_duration: u32,
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ProcessRecord {
    pid: Pid,
    size: u32,
    arrival_time: u32,
    cpu_time: u32,
    io_frequency: u32,
    io_duration: u32,
    /// Carried for input compatibility, external priorities rank by pid.
    priority: u32,
    pub(crate) state: ProcessState,
    pub(crate) remaining_time: u32,
    pub(crate) quantum_used: u32,
    pub(crate) io_remaining_time: u32,
    pub(crate) partition: Option<usize>,
    pub(crate) dispatch_time: Option<u32>,
}

impl ProcessRecord {
    pub fn new(descriptor: &ProcessDescriptor) -> Self {
        Self {
            pid: descriptor.pid,
            size: descriptor.size,
            arrival_time: descriptor.arrival_time,
            cpu_time: descriptor.cpu_time,
            io_frequency: descriptor.io_frequency,
            io_duration: descriptor.io_duration,
            priority: descriptor.priority,
            state: ProcessState::New,
            remaining_time: descriptor.cpu_time,
            quantum_used: 0,
            io_remaining_time: 0,
            partition: None,
            dispatch_time: None,
        }
    }

    /// CPU time consumed since the last dispatch, counting the tick that
    /// ends at `current_time + 1`.
    pub fn time_since_dispatch(&self, current_time: u32) -> u32 {
        match self.dispatch_time {
            Some(dispatch_time) => (current_time + 1).saturating_sub(dispatch_time),
            None => 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == ProcessState::Terminated
    }

    /// READY, RUNNING and WAITING processes are the ones holding memory.
    pub fn is_resident(&self) -> bool {
        matches!(
            self.state,
            ProcessState::Ready | ProcessState::Running | ProcessState::Waiting
        )
    }
}

/// Arena of every process in the run, addressed by pid. Queues elsewhere hold
/// pids only, so this is the single copy of each record.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    records: BTreeMap<Pid, ProcessRecord>,
    input_order: Vec<Pid>,
}

impl JobRegistry {
    pub fn new(descriptors: &[ProcessDescriptor]) -> Result<Self> {
        let mut records = BTreeMap::new();
        let mut input_order = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            if records
                .insert(descriptor.pid, ProcessRecord::new(descriptor))
                .is_some()
            {
                return Err(SimulationError::DuplicatePid(descriptor.pid));
            }
            input_order.push(descriptor.pid);
        }
        Ok(Self {
            records,
            input_order,
        })
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessRecord> {
        self.records.get(&pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in pid order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessRecord> {
        self.records.values()
    }

    /// Pids arriving at `time`, in input order.
    pub fn arrivals_at(&self, time: u32) -> Vec<Pid> {
        self.input_order
            .iter()
            .copied()
            .filter(|pid| self.records[pid].arrival_time == time)
            .collect()
    }

    /// Whether some process is still due to arrive at or after `time`.
    pub fn has_arrivals_from(&self, time: u32) -> bool {
        self.records
            .values()
            .any(|record| record.state == ProcessState::New && record.arrival_time >= time)
    }
}

impl Index<Pid> for JobRegistry {
    type Output = ProcessRecord;

    fn index(&self, pid: Pid) -> &ProcessRecord {
        &self.records[&pid]
    }
}

impl IndexMut<Pid> for JobRegistry {
    fn index_mut(&mut self, pid: Pid) -> &mut ProcessRecord {
        self.records
            .get_mut(&pid)
            .unwrap_or_else(|| panic!("process {} is not registered", pid))
    }
}
