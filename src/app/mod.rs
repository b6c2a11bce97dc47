pub mod assistant;
pub mod report;
