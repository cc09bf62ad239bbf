pub mod catalog;
pub mod cli;
pub mod config;
pub mod export;
pub mod logging;
pub mod probe;
