//! CLI parsing and run settings

pub mod cli;
pub mod settings;

pub use cli::{Cli, Command};
pub use settings::{Settings, WorkSource};
