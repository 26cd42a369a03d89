pub mod fixture;
pub mod report;
