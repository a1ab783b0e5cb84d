//! Error handling foundation for bookgate.
//!
//! This module provides only the `Result` type alias using rootcause.
//! Each crate defines its own domain-specific error enums in its own error
//! module. Orchestration layers return them wrapped in a `Report`, which `?`
//! builds from the plain enum, and callers inspect `current_context()`.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
///
/// `C` is the error enum at the top of the report.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
