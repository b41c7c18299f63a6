//! Shared configuration, data model and trace types.

pub mod config;
pub mod models;
pub mod trace;
