//! Delivery of finished artifacts.
//!
//! - [`FileSaver`]: the save collaborator, with [`DirectorySaver`] writing to disk
//! - [`DownloadAdapter`]: single and bulk download of successful entries

mod download;
mod saver;

pub use download::{DownloadAdapter, DownloadReport};
pub use saver::{DirectorySaver, FileSaver, MemorySaver};
