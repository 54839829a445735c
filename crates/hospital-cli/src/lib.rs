//! Command-line client for the hospital admin REST resource.
//!
//! # Key Abstractions
//!
//! - [`HospitalCli`]: loads configuration, installs logging, builds the
//!   transport stack and router, and dispatches commands
//! - [`HospitalConfig`]: `confyg`-backed settings for the backend, retries
//!   and route access

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod handlers;

pub use app::HospitalCli;
pub use cli::{BaseCommand, CliArgs, ConfigAction, ConfigCommand};
pub use config::HospitalConfig;
