//! Simulator configuration, loaded from YAML or taken from the defaults below
use log::info;
use serde_derive::{Deserialize, Serialize};
use std::fs;

use crate::error::{Result, SimulationError};

/// Partition sizes of the reference machine, in MB.
pub const DEFAULT_PARTITIONS: [u32; 6] = [40, 25, 15, 10, 8, 2];
pub const DEFAULT_TIME_QUANTUM: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    ExternalPriorities,
    #[default]
    ExternalPrioritiesRoundRobin,
}

impl SchedulingPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SchedulingPolicy::ExternalPriorities => "external_priorities",
            SchedulingPolicy::ExternalPrioritiesRoundRobin => "external_priorities_round_robin",
        }
    }
}

/// Order in which the allocator scans partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Partition index order.
    #[default]
    FirstFit,
    /// Smallest fitting partition, ties broken by index.
    BestFit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub partitions: Vec<u32>,
    pub time_quantum: u32,
    pub policy: SchedulingPolicy,
    pub placement: PlacementStrategy,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS.to_vec(),
            time_quantum: DEFAULT_TIME_QUANTUM,
            policy: SchedulingPolicy::default(),
            placement: PlacementStrategy::default(),
        }
    }
}

impl SimulatorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: SimulatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(file_path: &str) -> Result<Self> {
        let yaml = fs::read_to_string(file_path).map_err(|source| SimulationError::Io {
            path: file_path.to_owned(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        info!("Loaded configuration from {}", file_path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partitions.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "at least one memory partition is required".to_owned(),
            ));
        }
        if let Some(index) = self.partitions.iter().position(|&size| size == 0) {
            return Err(SimulationError::InvalidConfig(format!(
                "partition {} has size 0",
                index + 1
            )));
        }
        if self.policy == SchedulingPolicy::ExternalPrioritiesRoundRobin && self.time_quantum == 0 {
            return Err(SimulationError::InvalidConfig(
                "time_quantum must be positive for round robin".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_config_default_params() {
        let config = SimulatorConfig::default();
        assert_eq!(config.partitions, vec![40, 25, 15, 10, 8, 2]);
        assert_eq!(config.time_quantum, 100);
        assert_eq!(config.policy, SchedulingPolicy::ExternalPrioritiesRoundRobin);
        assert_eq!(config.placement, PlacementStrategy::FirstFit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_str_partial_keys() {
        let config = SimulatorConfig::from_yaml_str("time_quantum: 3\nplacement: best_fit\n").unwrap();
        assert_eq!(config.time_quantum, 3);
        assert_eq!(config.placement, PlacementStrategy::BestFit);
        assert_eq!(config.partitions, DEFAULT_PARTITIONS.to_vec());
    }

    #[test]
    fn test_from_yaml_str_policy() {
        let config = SimulatorConfig::from_yaml_str("policy: external_priorities\ntime_quantum: 0\n")
            .unwrap();
        assert_eq!(config.policy, SchedulingPolicy::ExternalPriorities);
    }

    #[test]
    fn test_from_yaml_str_empty_partitions() {
        let result = SimulatorConfig::from_yaml_str("partitions: []\n");
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_yaml_str_zero_partition() {
        let result = SimulatorConfig::from_yaml_str("partitions: [10, 0]\n");
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_yaml_str_zero_quantum_round_robin() {
        let result = SimulatorConfig::from_yaml_str("time_quantum: 0\n");
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_yaml_str_unknown_policy() {
        let result = SimulatorConfig::from_yaml_str("policy: shortest_job_first\n");
        assert!(matches!(result, Err(SimulationError::Serde(_))));
    }
}
