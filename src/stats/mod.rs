pub mod robust_statistics;
pub mod query_measurement;
