pub mod error;
pub mod validation;
pub mod formats;
pub mod fs;

pub use error::{
    BatchError, ConfigError, ExportError, FailureKind, RejectionReason, TransformError,
    TransformResult, TransportError, UnknownFormat,
};
pub use validation::{AcceptPolicy, Validator, ValidatorSet};
pub use formats::{TargetFormat, extension_for_media_type, extension_of, is_image_media_type};
pub use fs::{base_name, extract_filename, output_file_name, read_source_file, sanitize_for_id};
