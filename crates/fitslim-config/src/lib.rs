// crates/fitslim-config/src/lib.rs
// ============================================================================
// Module: FitSlim Config Library
// Description: Canonical config model, validation and file exclusions.
// Purpose: Single source of truth for fitslim.toml semantics.
// Dependencies: fitslim-wire, regex, serde, toml
// ============================================================================

//! ## Overview
//! `fitslim-config` defines the configuration model for the Slim server and
//! the [`FileExclusions`] list used to skip test files by name. Validation is
//! strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod exclusions;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use exclusions::FileExclusions;
