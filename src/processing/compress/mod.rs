//! Local lossy compression.
//!
//! - [`CompressStrategy`]: decodes, scales by a fixed factor and re-encodes as JPEG.
//! - [`resize`]: dimension arithmetic and resampling.
//! - [`encode`]: quality mapping and the JPEG encoder.

mod encode;
mod executor;
mod resize;

pub use executor::CompressStrategy;
pub use resize::scaled_dimensions;
