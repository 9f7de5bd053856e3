pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod memory;
pub mod output_log;
pub mod process;
pub mod process_creator;
pub mod scheduler;
pub mod simulation;
pub mod util;
