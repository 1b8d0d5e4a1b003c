pub mod service;
pub mod shared_metrics;
