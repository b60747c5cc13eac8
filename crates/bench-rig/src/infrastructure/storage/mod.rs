//! Storage infrastructure: the bench configuration file.

pub mod config;
