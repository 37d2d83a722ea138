pub mod generate;
pub mod parse;
pub mod report;

pub use generate::{GeneratorConfig, random_workload};
pub use parse::{load_workload, parse_workload, write_workload};
