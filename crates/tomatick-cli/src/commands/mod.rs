pub mod config;
pub mod export;
pub mod stats;
pub mod timer;
