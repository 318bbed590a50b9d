//! Session log inspector CLI library.
//!
//! This crate provides the CLI interface for inspecting session logs.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
