//! # Binaa Support
//!
//! Shared utilities for the Binaa constructor registry.
//!
//! This crate provides:
//! - Text rendering for diagnostics (cycles, conflicts, introspection)
//! - "Did you mean?" suggestions for missing dependencies

pub mod rendering;
