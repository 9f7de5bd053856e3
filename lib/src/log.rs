use serde_derive::{Deserialize, Serialize};

use crate::{
    memory::MemorySnapshot,
    output_log::append_info_to_yaml,
    process::{Pid, ProcessState},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub time: u32,
    pub pid: Pid,
    pub old_state: ProcessState,
    pub new_state: ProcessState,
}

/// Conditions the engine detected and resolved instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Anomaly {
    /// The process is larger than every partition and was never admitted.
    Unschedulable {
        time: u32,
        pid: Pid,
        size: u32,
        largest_partition: u32,
    },
    /// Nothing could make progress while these processes were unfinished;
    /// they were force-terminated.
    Livelock {
        time: u32,
        pids: Vec<Pid>,
        remaining_times: Vec<u32>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationLog {
    pub transitions: Vec<TransitionEvent>,
    pub memory_snapshots: Vec<MemorySnapshot>,
    pub anomalies: Vec<Anomaly>,
}

impl SimulationLog {
    pub fn write_transition(
        &mut self,
        time: u32,
        pid: Pid,
        old_state: ProcessState,
        new_state: ProcessState,
    ) {
        self.transitions.push(TransitionEvent {
            time,
            pid,
            old_state,
            new_state,
        });
    }

    pub fn write_memory_snapshot(&mut self, snapshot: MemorySnapshot) {
        self.memory_snapshots.push(snapshot);
    }

    pub fn write_anomaly(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    /// Transitions of one process, in emission order.
    pub fn transitions_of(&self, pid: Pid) -> Vec<&TransitionEvent> {
        self.transitions
            .iter()
            .filter(|event| event.pid == pid)
            .collect()
    }

    pub fn unschedulable_pids(&self) -> Vec<Pid> {
        self.anomalies
            .iter()
            .filter_map(|anomaly| match anomaly {
                Anomaly::Unschedulable { pid, .. } => Some(*pid),
                _ => None,
            })
            .collect()
    }

    pub fn dump_log_to_yaml(&self, file_path: &str) {
        self.dump_transitions_to_yaml(file_path);
        self.dump_memory_snapshots_to_yaml(file_path);
        self.dump_anomalies_to_yaml(file_path);
    }

    pub fn dump_transitions_to_yaml(&self, file_path: &str) {
        #[derive(Serialize)]
        struct Transitions<'a> {
            transitions: &'a [TransitionEvent],
        }
        let yaml = serde_yaml::to_string(&Transitions {
            transitions: &self.transitions,
        })
        .expect("Failed to serialize transitions to YAML");
        append_info_to_yaml(file_path, &yaml);
    }

    pub fn dump_memory_snapshots_to_yaml(&self, file_path: &str) {
        #[derive(Serialize)]
        struct MemorySnapshots<'a> {
            memory_snapshots: &'a [MemorySnapshot],
        }
        let yaml = serde_yaml::to_string(&MemorySnapshots {
            memory_snapshots: &self.memory_snapshots,
        })
        .expect("Failed to serialize memory snapshots to YAML");
        append_info_to_yaml(file_path, &yaml);
    }

    pub fn dump_anomalies_to_yaml(&self, file_path: &str) {
        #[derive(Serialize)]
        struct Anomalies<'a> {
            anomalies: &'a [Anomaly],
        }
        let yaml = serde_yaml::to_string(&Anomalies {
            anomalies: &self.anomalies,
        })
        .expect("Failed to serialize anomalies to YAML");
        append_info_to_yaml(file_path, &yaml);
    }
}
