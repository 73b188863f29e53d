//! Command implementations for the docgen CLI
//!
//! Each command module handles the CLI interface and delegates to
//! docgen-core for the actual work.

pub mod generate;
