//! Core application types and state management.
//!
//! This module contains the fundamental types used throughout the crate:
//! - [`FileEntry`]: one file and its lifecycle state
//! - [`TransformedArtifact`]: output of a successful transformation
//! - [`BatchSnapshot`] / [`BatchProgress`]: read-only views for rendering
//! - [`AppConfig`]: externally supplied configuration
//! - [`AppState`]: configuration plus the shared HTTP client

mod config;
mod entry;
mod progress;
mod state;
mod types;

pub use config::{AppConfig, CompressConfig, ConvertConfig, HttpConfig, RemoveBackgroundConfig};
pub use entry::{EntryError, EntryId, EntryState, FileEntry, SourceFile};
pub use progress::{BatchProgress, BatchSnapshot, EntryView, RunSummary};
pub use state::AppState;
pub use types::{TransformMode, TransformedArtifact};
