pub mod alerts;
pub mod orchestrator;
pub mod table;
pub mod timeseries;
