pub mod anomaly;
pub mod correlation;
pub mod statistics;
