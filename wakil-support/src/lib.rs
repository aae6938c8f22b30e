//! # Wakil Support
//!
//! Shared utilities for the Wakil crates.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - "Did you mean?" suggestions for mistyped keys and service names

pub mod rendering;
