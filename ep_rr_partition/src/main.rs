mod outputs_result;

use clap::Parser;
use lib::config::SimulatorConfig;
use lib::error::Result;
use lib::output_log::create_scheduler_log_yaml_file;
use lib::process_creator::create_process_set_from_yaml;
use lib::simulation::Simulation;
use log::{error, info};
use outputs_result::dump_simulation_result_to_file;

#[derive(Parser)]
#[clap(
    name = "EP_RR_Partition_Simulator",
    version = "1.0",
    about = "About:
    Simulates a uniprocessor scheduling processes by external priorities
    (lower pid first) with round-robin preemption, admitting them into
    fixed memory partitions. Without a config file the default partition
    table [40, 25, 15, 10, 8, 2] and a quantum of 100 are used."
)]
struct ArgParser {
    ///Path to the process set YAML file.
    #[clap(short = 'f', long = "process_file_path", required = true)]
    process_file_path: String,
    ///Path to the simulator configuration YAML file.
    #[clap(short = 'c', long = "config_file_path", required = false)]
    config_file_path: Option<String>,
    ///Path to output directory.
    #[clap(short = 'o', long = "output_dir_path", default_value = "../outputs")]
    output_dir_path: String,
}

fn run(arg: &ArgParser) -> Result<String> {
    let config = match &arg.config_file_path {
        Some(config_file_path) => SimulatorConfig::from_yaml_file(config_file_path)?,
        None => SimulatorConfig::default(),
    };
    let process_set = create_process_set_from_yaml(&arg.process_file_path)?;

    let mut simulation = Simulation::new(&process_set, &config)?;
    simulation.run();

    let file_path = create_scheduler_log_yaml_file(&arg.output_dir_path, config.policy.name());
    dump_simulation_result_to_file(&file_path, &simulation);
    simulation.log().dump_log_to_yaml(&file_path);
    Ok(file_path)
}

fn main() {
    env_logger::init();
    let arg: ArgParser = ArgParser::parse();

    match run(&arg) {
        Ok(file_path) => info!("Wrote simulation log to {}", file_path),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    }
}
