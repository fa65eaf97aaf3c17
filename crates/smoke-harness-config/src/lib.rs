// crates/smoke-harness-config/src/lib.rs
// ============================================================================
// Module: Smoke Harness Config Library
// Description: Harness file model, validation, and environment overrides.
// Purpose: Single source of truth for smoke-harness.toml semantics.
// Dependencies: serde, smoke-harness-core, thiserror, toml
// ============================================================================

//! ## Overview
//! `smoke-harness-config` defines the per-application harness file and turns
//! it into the typed values the core library consumes: container specs,
//! readiness policies, run contexts, discovery candidates, and case lists.
//! Validation is strict and fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod env;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AppConfig;
pub use config::BrowserConfig;
pub use config::ConfigError;
pub use config::ContainerConfig;
pub use config::DEFAULT_CONFIG_NAME;
pub use config::HarnessConfig;
pub use config::ReadinessConfig;
pub use config::RunnerConfig;
pub use config::derive_base_url_env;
pub use env::HarnessEnv;
pub use env::HarnessEnvKey;
pub use env::parse_verbose;
pub use env::read_env_strict;
pub use examples::harness_toml_example;
