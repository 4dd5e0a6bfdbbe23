//! Utility functions shared across the pipeline.
//!
//! This module provides:
//! - Error retriability determination
//! - String sanitization utilities

pub(crate) mod retry;
pub mod sanitize;
