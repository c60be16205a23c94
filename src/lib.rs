//! Aletheia: progressive codex synthesis
//!
//! Builds a hierarchical book (sections, chapters, fragments) with a
//! generative model in two phases. Scaffolding asks for fragment titles one
//! section at a time; synthesis asks for fragment text one chapter at a time.
//! Every unit is committed and persisted as soon as it succeeds.

pub mod book;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod invocation;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod store;
