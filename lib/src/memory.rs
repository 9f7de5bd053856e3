//! Fixed-partition memory allocator and the memory snapshots it reports
use getset::CopyGetters;
use log::{debug, warn};
use serde_derive::{Deserialize, Serialize};

use crate::{
    config::PlacementStrategy,
    process::{Pid, ProcessRecord},
};

#[derive(Debug, Clone, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Partition {
    /// 1-based, as printed in the memory status.
    number: usize,
    size: u32,
    occupant: Option<Pid>,
}

impl Partition {
    pub fn new(number: usize, size: u32) -> Self {
        Self {
            number,
            size,
            occupant: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionStatus {
    pub number: usize,
    pub size: u32,
    pub occupant: Option<Pid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub time: u32,
    pub running: Option<Pid>,
    pub ready_count: usize,
    pub waiting_count: usize,
    pub partitions: Vec<PartitionStatus>,
    pub total_used: u32,
    pub total_free: u32,
    /// Free memory that could hold the smallest process still lacking a
    /// partition.
    pub usable: u32,
}

#[derive(Debug, Clone)]
pub struct MemoryAllocator {
    partitions: Vec<Partition>,
    placement: PlacementStrategy,
}

impl MemoryAllocator {
    pub fn new(partition_sizes: &[u32], placement: PlacementStrategy) -> Self {
        let partitions = partition_sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| Partition::new(i + 1, size))
            .collect::<Vec<Partition>>();
        Self {
            partitions,
            placement,
        }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn largest_partition(&self) -> u32 {
        self.partitions
            .iter()
            .map(|partition| partition.size)
            .max()
            .unwrap_or(0)
    }

    /// Whether the process could be placed once every partition is free.
    pub fn can_ever_fit(&self, size: u32) -> bool {
        size <= self.largest_partition()
    }

    fn scan_order(&self) -> Vec<usize> {
        let mut order = (0..self.partitions.len()).collect::<Vec<usize>>();
        if self.placement == PlacementStrategy::BestFit {
            // stable, so equal sizes stay in index order
            order.sort_by_key(|&i| self.partitions[i].size);
        }
        order
    }

    /// Give the process the first free partition that fits it.
    /// Returns false, leaving both sides untouched, when none does.
    pub fn assign_memory(&mut self, record: &mut ProcessRecord) -> bool {
        if record.partition.is_some() {
            warn!("Process {} already holds a partition", record.pid());
            return true;
        }
        let found = self.scan_order().into_iter().find(|&i| {
            let partition = &self.partitions[i];
            partition.is_free() && partition.size >= record.size()
        });
        match found {
            Some(i) => {
                let partition = &mut self.partitions[i];
                partition.occupant = Some(record.pid());
                record.partition = Some(partition.number);
                debug!(
                    "Assigned partition {} ({}MB) to process {}",
                    partition.number,
                    partition.size,
                    record.pid()
                );
                true
            }
            None => false,
        }
    }

    /// Release the process's partition. Freeing twice is a no-op.
    pub fn free_memory(&mut self, record: &mut ProcessRecord) {
        let Some(number) = record.partition.take() else {
            debug!("Process {} holds no partition to free", record.pid());
            return;
        };
        match self.partitions.get_mut(number - 1) {
            Some(partition) if partition.occupant == Some(record.pid()) => {
                partition.occupant = None;
            }
            _ => warn!(
                "Partition {} was not held by process {}",
                number,
                record.pid()
            ),
        }
    }

    pub fn total_used(&self) -> u32 {
        self.partitions
            .iter()
            .filter(|partition| !partition.is_free())
            .map(|partition| partition.size)
            .sum()
    }

    pub fn total_free(&self) -> u32 {
        self.partitions
            .iter()
            .filter(|partition| partition.is_free())
            .map(|partition| partition.size)
            .sum()
    }

    /// With no unassigned process every free byte is usable; otherwise only
    /// free partitions large enough for the smallest unassigned process count.
    pub fn usable(&self, smallest_unassigned: Option<u32>) -> u32 {
        match smallest_unassigned {
            None => self.total_free(),
            Some(size) => self
                .partitions
                .iter()
                .filter(|partition| partition.is_free() && partition.size >= size)
                .map(|partition| partition.size)
                .sum(),
        }
    }

    pub fn memory_snapshot(
        &self,
        time: u32,
        running: Option<Pid>,
        ready_count: usize,
        waiting_count: usize,
        smallest_unassigned: Option<u32>,
    ) -> MemorySnapshot {
        MemorySnapshot {
            time,
            running,
            ready_count,
            waiting_count,
            partitions: self
                .partitions
                .iter()
                .map(|partition| PartitionStatus {
                    number: partition.number,
                    size: partition.size,
                    occupant: partition.occupant,
                })
                .collect(),
            total_used: self.total_used(),
            total_free: self.total_free(),
            usable: self.usable(smallest_unassigned),
        }
    }
}
