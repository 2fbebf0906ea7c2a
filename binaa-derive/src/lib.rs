//! Derive macros for Binaa parameter and result objects.
//!
//! Re-exports `#[derive(In)]` and `#[derive(Out)]` from `binaa-macros`.
//! The generated code refers to the `binaa` facade crate, so depend on
//! `binaa` rather than on this crate directly.

pub use binaa_macros::{In, Out};
