//! Core types for Pixelpress.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod actor;
pub mod id;

pub use actor::{Actor, Role, RoleParseError};
pub use id::*;
