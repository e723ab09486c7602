//! Shared data model layer (structs/constants only).
//!
//! ## Purpose
//! - Keep request/response shapes exchanged with the server in one place.
//! - Make JSON output schema changes explicit and reviewable.
//!
//! ## Files
//! - `models.rs`: units, options, call reports, schedules, output envelopes.
//! - `constants.rs`: unit type id, rendered field lists, config defaults.
//!
//! ## Rule of thumb
//! Domain types should be data-only: no filesystem/network side effects.
//!
//! ## Compatibility note
//! Changes in these structs can affect `--json` outputs. Keep them in sync
//! with `docs/contracts/*`.

pub mod constants;
pub mod models;
