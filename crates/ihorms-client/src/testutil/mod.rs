//! Test utilities for the client crate

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
