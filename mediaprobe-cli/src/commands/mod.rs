//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `info` command.
/// This command probes media files and prints their container and stream data.
pub mod info;
