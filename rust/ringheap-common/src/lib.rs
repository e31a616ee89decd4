//! Core definitions (error type and argument verification), relied upon by all ringheap-* crates.

pub mod error;
pub mod result;

pub use result::Result;
