//! Shared helpers.
//!
//! - [`exec`]: external command runner (preprocessor invocation)
//! - [`path`]: path normalization

pub mod exec;
pub mod path;
