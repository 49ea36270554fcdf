//! Infrastructure layer - filesystem output and shell commands

pub mod output;
pub mod shell;

pub use output::*;
pub use shell::*;
