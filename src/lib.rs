pub mod advisor;
pub mod cli;
pub mod config;
pub mod format;
pub mod logging;
pub mod monitor;
pub mod scheduler;
pub mod system;
