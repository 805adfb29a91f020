#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod fluid;
pub mod tag;

// Re-export commonly used types
pub use fluid::{FluidId, FluidIdError, FluidStack};
pub use tag::{TagCompound, TagError, TagValue};
