//! Integration tests for the Aletheia codex workflows

mod config_integration;
mod scaffold_workflow;
mod store_integration;
mod synthesis_workflow;
mod test_utils;
