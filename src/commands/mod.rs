//! Command handlers for the command-line front end.
//!
//! - [`transform_files`]: read files from disk, run one batch, save the results
//! - [`transform_sources`]: the same for files already in memory

mod batch;

pub use batch::*;
