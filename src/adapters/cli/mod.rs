//! CLI Adapter
//!
//! Command-line interface for dealer-edge.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{execute, AggregateCmd, AnalyzeCmd, CliApp, Command, DefaultsCmd};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
