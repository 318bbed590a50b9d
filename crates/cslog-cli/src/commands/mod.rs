//! CLI subcommand implementations.

pub mod project;
pub mod projects;
pub mod session;
pub mod util;

#[cfg(test)]
mod fixtures;
