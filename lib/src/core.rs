//! This module contains the definition of the core and the process result enum
use crate::{
    core::ProcessResult::*,
    process::{Pid, ProcessRecord},
};
use log::warn;
use num_integer::Integer;

///enum to represent the outcome of one unit of execution
///nothing allocated, still running, or the process left the core for one of three reasons
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessResult {
    Idle,
    Continue,
    Done(Pid),
    QuantumExpired(Pid),
    IoRequest(Pid),
}

#[derive(Clone, Default)]
pub struct Core {
    pub processing_pid: Option<Pid>,
}

/// A process issues an I/O request each time the CPU time it has used since
/// its last dispatch reaches a multiple of its I/O frequency.
pub fn should_request_io(record: &ProcessRecord, time_ran: u32) -> bool {
    record.io_frequency() > 0
        && time_ran > 0
        && Integer::is_multiple_of(&time_ran, &record.io_frequency())
}

///return bool since "panic!" would terminate
impl Core {
    pub fn is_idle(&self) -> bool {
        self.processing_pid.is_none()
    }

    pub fn allocate(&mut self, record: &mut ProcessRecord, current_time: u32) -> bool {
        if let Some(pid) = self.processing_pid {
            warn!("Core is already allocated to process {}", pid);
            return false;
        }
        self.processing_pid = Some(record.pid());
        record.dispatch_time = Some(current_time);
        record.quantum_used = 0;
        true
    }

    /// Run the allocated process for one time unit. Completion is checked
    /// before quantum expiry, which is checked before an I/O request.
    pub fn process(
        &mut self,
        record: &mut ProcessRecord,
        time_quantum: Option<u32>,
        current_time: u32,
    ) -> ProcessResult {
        let Some(pid) = self.processing_pid else {
            return Idle;
        };
        if pid != record.pid() {
            warn!(
                "Core is running process {} but was handed process {}",
                pid,
                record.pid()
            );
            return Continue;
        }
        record.remaining_time = record.remaining_time.saturating_sub(1);
        record.quantum_used += 1;

        let result = if record.remaining_time == 0 {
            Done(pid)
        } else if time_quantum.is_some_and(|quantum| record.quantum_used >= quantum) {
            QuantumExpired(pid)
        } else if should_request_io(record, record.time_since_dispatch(current_time)) {
            IoRequest(pid)
        } else {
            Continue
        };
        if result != Continue {
            self.processing_pid = None;
        }
        result
    }

    /// Take the running process off the core, e.g. on preemption.
    pub fn release(&mut self) -> Option<Pid> {
        self.processing_pid.take()
    }
}
