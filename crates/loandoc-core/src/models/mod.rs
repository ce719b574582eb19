//! Data models and configuration.

pub mod config;
pub mod document;
pub mod loan;
