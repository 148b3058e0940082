//! Library surface of the graphscale command-line driver.

pub mod cli;
pub mod config;
pub mod logging;
