//! roseread Core Library
//!
//! This crate provides the geometric value types shared by the decoders
//! and the command-line tool.

pub mod types;

pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::types::*;
}
