//! strataconf-cli: Command-line interface for strataconf

mod cli;

pub use cli::run;
