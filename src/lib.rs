// Module declarations in dependency order
pub mod commands;
pub mod core;
pub mod export;
pub mod processing;
pub mod utils;

// Public exports for external consumers
pub use core::{
    AppConfig, AppState, BatchProgress, BatchSnapshot, EntryId, EntryState, FileEntry, SourceFile,
    TransformMode, TransformedArtifact,
};
pub use export::{DirectorySaver, DownloadAdapter, FileSaver, MemorySaver};
pub use processing::{BatchCoordinator, StrategySet, TransformStrategy};
pub use utils::{FailureKind, RejectionReason, TargetFormat, TransformError, TransformResult};
pub use commands::*;

// This library file is used as a public API for consuming this crate as a library.
// The command-line entry point is in main.rs.
