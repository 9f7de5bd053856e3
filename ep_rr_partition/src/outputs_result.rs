use lib::{output_log::append_info_to_yaml, simulation::Simulation};
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct ResultInfo {
    policy: String,
    schedule_length: u32,
    busy_time: u32,
    cpu_utilization: f32,
    terminated_processes: usize,
    unschedulable_processes: Vec<u32>,
    anomaly_count: usize,
}

pub fn dump_simulation_result_to_file(file_path: &str, simulation: &Simulation) {
    let schedule_length = simulation.current_time();
    let busy_time = simulation.busy_time();
    let cpu_utilization = if schedule_length == 0 {
        0.0
    } else {
        busy_time as f32 / schedule_length as f32
    };
    let result_info = ResultInfo {
        policy: simulation.scheduler_name().to_owned(),
        schedule_length,
        busy_time,
        cpu_utilization,
        terminated_processes: simulation
            .registry()
            .iter()
            .filter(|record| record.is_terminated())
            .count(),
        unschedulable_processes: simulation.log().unschedulable_pids(),
        anomaly_count: simulation.log().anomalies.len(),
    };
    let yaml = serde_yaml::to_string(&result_info)
        .expect("Failed to serialize simulation result to YAML");

    append_info_to_yaml(file_path, &yaml);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib::{
        config::SimulatorConfig, output_log::create_scheduler_log_yaml_file,
        process_creator::create_process_set_from_yaml,
    };
    use std::fs::remove_file;

    #[test]
    fn test_dump_simulation_result_to_file_normal() {
        let process_set =
            create_process_set_from_yaml("../lib/tests/sample_processes/oversized.yaml").unwrap();
        let mut simulation = Simulation::new(&process_set, &SimulatorConfig::default()).unwrap();
        simulation.run();

        let file_path = create_scheduler_log_yaml_file(
            "../lib/tests",
            "test_dump_simulation_result_to_file_normal",
        );
        dump_simulation_result_to_file(&file_path, &simulation);

        let file_contents = std::fs::read_to_string(&file_path).unwrap();
        let result_info: ResultInfo = serde_yaml::from_str(&file_contents).unwrap();

        assert_eq!(result_info.policy, "external_priorities_round_robin");
        assert_eq!(result_info.schedule_length, 5);
        assert_eq!(result_info.busy_time, 5);
        assert_eq!(result_info.cpu_utilization, 1.0);
        assert_eq!(result_info.terminated_processes, 1);
        assert_eq!(result_info.unschedulable_processes, vec![2]);
        assert_eq!(result_info.anomaly_count, 1);

        remove_file(file_path).unwrap();
    }
}
