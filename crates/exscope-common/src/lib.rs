//! Common types and utilities for the exscope scope engine.
//!
//! This crate provides foundational types used across all exscope crates:
//! - Source spans (`Span`)
//! - Diagnostic records, codes and message templates
//! - Engine limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Centralized limits and thresholds
pub mod limits;

// Diagnostic types and message lookup
pub mod diagnostics;
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation, diagnostic_codes,
    format_message, get_message_template,
};
