//! Process-wide setup performed before the pipeline runs.

mod logger;

pub use logger::init_logger_with;
