//! Common types, traits, and error definitions for tps_rrt
//!
//! This module provides the foundational building blocks shared by the
//! trajectory generators, the motion tree and the planner.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
