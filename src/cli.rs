//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    format_event, format_scaffold_report, format_selection_json, format_selection_text,
    format_status_json, format_status_text, format_synthesis_report, CodexStatus, SectionStatus,
};
pub use route::RunContext;
