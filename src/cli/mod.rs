pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ExportFormat, OutputFormat};
pub use commands::run;
