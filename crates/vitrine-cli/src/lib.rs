//! Command line for Vitrine.
//!
//! Loads [`VitrineConfig`], initialises logging, and dispatches the
//! `ingest`, `search`, `stats` and `config` commands against a snapshot
//! directory backed by the in-memory store.

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::{StoreStats, VitrineApp, init_logging};
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::VitrineConfig;
