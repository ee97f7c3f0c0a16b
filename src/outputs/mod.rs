//! Where the finished post and run diagnostics are written.
//!
//! # Submodules
//!
//! - [`file`]: the persistence sink for the approved post
//! - [`json`]: optional JSON dump of the final workflow state
//!
//! The post file is overwritten on every successful run and never touched
//! on a failed one.

pub mod file;
pub mod json;
