//! Command implementations

pub mod admin;
pub mod config;
pub mod developer;
pub mod version;
