//! Core domain models for flatpack
//!
//! This module defines the data structures that represent a package, its
//! entry points, their build status, and the per-unit artifact workspace.

pub mod config;
pub mod package;
pub mod state;
pub mod workspace;

pub use package::*;
pub use state::*;
pub use workspace::*;
