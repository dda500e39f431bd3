//! Utility modules: logging, developer bench logs, numeric conversions.
pub mod devlog;
pub mod logger;
pub mod num;
