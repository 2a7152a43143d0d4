//! Configuration management for the Member Portal
//!
//! This crate provides functionality for managing configuration settings
//! for the member portal, with support for different configuration sources.

pub mod manager;

// Re-export commonly used types
pub use manager::ConfigManager;
