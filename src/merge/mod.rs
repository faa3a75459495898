//! Partial-update merger
//!
//! Applies a sparse update to a stored record by overlaying it on the
//! stored raw fields and rebuilding through the full record pipeline.
//! Derived fields are never carried over from the stored record.

mod merger;
mod update;

pub use merger::Merger;
pub use update::{Patch, PartialUpdate};
