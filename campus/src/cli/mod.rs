//! Command-line interface.

mod args;
mod commands;
mod render;

pub use args::Cli;
pub use commands::execute;
