pub mod aggregation;
pub mod analysis_record;
pub mod config;
pub mod entity;
pub mod finance;
pub mod folder;
pub mod report;
pub mod rubric;
