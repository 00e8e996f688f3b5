//! Error handling foundation for aiflow.
//!
//! Each crate defines its own error enums next to the code that raises them.
//! Binaries wrap those enums in a rootcause `Report` at the boundary, where
//! the report's rendering is what the user sees.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
