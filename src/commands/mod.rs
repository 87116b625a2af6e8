pub mod aggregation;
pub mod analysis;
pub mod db;
pub mod report;
pub mod settings;
pub mod store;
