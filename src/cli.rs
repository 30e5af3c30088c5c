//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; a single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, OutputFormat, SignatureSource, StoreCommands};
pub use route::RunContext;
