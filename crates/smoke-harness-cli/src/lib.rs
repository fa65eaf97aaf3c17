// crates/smoke-harness-cli/src/lib.rs
// ============================================================================
// Module: Smoke Harness CLI Library
// Description: Shared helpers for the smoke-harness command-line interface.
// Purpose: Provide reusable components (i18n, console reporting) for the binary.
// Dependencies: smoke-harness-core
// ============================================================================

//! ## Overview
//! This library houses the message catalog and the terminal reporter. The
//! binary entry point (`src/main.rs`) imports these helpers so every line an
//! operator sees is rendered the same way.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Terminal rendering of smoke results.
pub mod console;
/// Internationalization helpers and message catalog.
pub mod i18n;
