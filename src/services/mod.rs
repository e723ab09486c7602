//! Service layer containing side-effect helpers shared by command handlers.
//!
//! ## Service map
//! - `config.rs`: config file discovery, parsing and CLI overrides.
//! - `polling.rs`: rejected/postponed checks and task polling.
//! - `output.rs`: prompt rendering and JSON envelopes.
//! - `spinner.rs`: stderr progress indicator used while polling.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects should be explicit and localized.
//! - Keep command handlers thin; delegate to services.

pub mod config;
pub mod output;
pub mod polling;
pub mod spinner;
