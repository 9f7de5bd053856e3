//! Build the process set from a yaml file
use std::collections::BTreeSet;

use log::info;
use yaml_rust::Yaml;

use crate::error::{Result, SimulationError};
use crate::process::ProcessDescriptor;
use crate::util::{load_yaml, load_yaml_str};

const REQUIRED_KEYS: [&str; 4] = ["pid", "size", "arrival_time", "cpu_time"];
const OPTIONAL_KEYS: [&str; 3] = ["io_frequency", "io_duration", "priority"];

fn get_param(process: &Yaml, key: &str, index: usize) -> Result<Option<u32>> {
    match &process[key] {
        Yaml::BadValue => Ok(None),
        Yaml::Integer(value) => u32::try_from(*value).map(Some).map_err(|_| {
            SimulationError::InvalidDescriptor(format!(
                "process #{}: {} must be a non-negative integer, got {}",
                index, key, value
            ))
        }),
        other => Err(SimulationError::InvalidDescriptor(format!(
            "process #{}: {} must be an integer, got {:?}",
            index, key, other
        ))),
    }
}

fn create_descriptor(process: &Yaml, index: usize) -> Result<ProcessDescriptor> {
    if process.as_hash().is_none() {
        return Err(SimulationError::InvalidDescriptor(format!(
            "process #{} is not a mapping",
            index
        )));
    }
    let mut required = [0u32; REQUIRED_KEYS.len()];
    for (slot, key) in required.iter_mut().zip(REQUIRED_KEYS) {
        *slot = get_param(process, key, index)?.ok_or_else(|| {
            SimulationError::InvalidDescriptor(format!("process #{} has no {}", index, key))
        })?;
    }
    let mut optional = [0u32; OPTIONAL_KEYS.len()];
    for (slot, key) in optional.iter_mut().zip(OPTIONAL_KEYS) {
        *slot = get_param(process, key, index)?.unwrap_or(0);
    }
    let [pid, size, arrival_time, cpu_time] = required;
    let [io_frequency, io_duration, priority] = optional;
    Ok(ProcessDescriptor {
        pid,
        size,
        arrival_time,
        cpu_time,
        io_frequency,
        io_duration,
        priority,
    })
}

fn create_process_set(yaml_docs: &[Yaml], origin: &str) -> Result<Vec<ProcessDescriptor>> {
    let processes = yaml_docs
        .first()
        .and_then(|doc| doc["processes"].as_vec())
        .ok_or_else(|| {
            SimulationError::InvalidDescriptor(format!("{} has no `processes` list", origin))
        })?;

    let mut pids = BTreeSet::new();
    let mut process_set = Vec::with_capacity(processes.len());
    for (index, process) in processes.iter().enumerate() {
        let descriptor = create_descriptor(process, index)?;
        if !pids.insert(descriptor.pid) {
            return Err(SimulationError::DuplicatePid(descriptor.pid));
        }
        process_set.push(descriptor);
    }
    Ok(process_set)
}

/// load yaml file and return the process descriptors in file order
///
/// # Arguments
///
/// *  `file_path` - yaml file path
///
/// # Example
///
/// ```
/// use lib::process_creator::create_process_set_from_yaml;
///
/// let process_set = create_process_set_from_yaml("tests/sample_processes/mixed.yaml").unwrap();
/// assert_eq!(process_set[0].pid, 1);
/// ```
pub fn create_process_set_from_yaml(file_path: &str) -> Result<Vec<ProcessDescriptor>> {
    let process_set = create_process_set(&load_yaml(file_path)?, file_path)?;
    info!("Loaded {} processes from {}", process_set.len(), file_path);
    Ok(process_set)
}

pub fn create_process_set_from_str(yaml: &str) -> Result<Vec<ProcessDescriptor>> {
    create_process_set(&load_yaml_str(yaml, "inline")?, "inline")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_process_set_from_yaml_normal() {
        let process_set = create_process_set_from_yaml("tests/sample_processes/mixed.yaml").unwrap();
        assert_eq!(process_set.len(), 4);
        assert_eq!(
            process_set[1],
            ProcessDescriptor {
                pid: 2,
                size: 25,
                arrival_time: 3,
                cpu_time: 12,
                io_frequency: 4,
                io_duration: 2,
                priority: 1,
            }
        );
    }

    #[test]
    fn test_create_process_set_optional_keys_default_to_zero() {
        let process_set = create_process_set_from_str(
            "processes:\n  - {pid: 4, size: 3, arrival_time: 1, cpu_time: 9}\n",
        )
        .unwrap();
        assert_eq!(process_set[0].io_frequency, 0);
        assert_eq!(process_set[0].io_duration, 0);
        assert_eq!(process_set[0].priority, 0);
    }

    #[test]
    fn test_create_process_set_missing_key() {
        let result =
            create_process_set_from_str("processes:\n  - {pid: 4, size: 3, arrival_time: 1}\n");
        assert!(matches!(result, Err(SimulationError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_create_process_set_negative_value() {
        let result = create_process_set_from_str(
            "processes:\n  - {pid: 4, size: -3, arrival_time: 1, cpu_time: 9}\n",
        );
        assert!(matches!(result, Err(SimulationError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_create_process_set_not_integer() {
        let result = create_process_set_from_str(
            "processes:\n  - {pid: 4, size: 3.5, arrival_time: 1, cpu_time: 9}\n",
        );
        assert!(matches!(result, Err(SimulationError::InvalidDescriptor(_))));
    }

    #[test]
    fn test_create_process_set_duplicate_pid() {
        let result = create_process_set_from_yaml("tests/sample_processes/duplicate_pid.yaml");
        assert!(matches!(result, Err(SimulationError::DuplicatePid(2))));
    }

    #[test]
    fn test_create_process_set_no_processes_key() {
        let result = create_process_set_from_str("jobs: []\n");
        assert!(matches!(result, Err(SimulationError::InvalidDescriptor(_))));
    }
}
