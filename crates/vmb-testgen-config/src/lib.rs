// crates/vmb-testgen-config/src/lib.rs
// ============================================================================
// Module: VMB Test Generator Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for vmb-testgen.toml semantics.
// Dependencies: serde, toml, vmb-testgen-core
// ============================================================================

//! ## Overview
//! `vmb-testgen-config` defines the generator configuration: definition
//! inputs, output layout, the external compiler command, and event logging.
//! Config inputs are untrusted and validated fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
