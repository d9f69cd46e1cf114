//! Strategies backed by remote services.
//!
//! - [`HttpClient`]: the network seam, with [`ReqwestHttpClient`] for production
//!   and [`MockHttpClient`] for tests.
//! - [`ConvertStrategy`]: format conversion, base64 JSON replies.
//! - [`RemoveBackgroundStrategy`]: matting, raw PNG replies.
//!
//! Both strategies share the status-to-message mapping in [`errors`].

mod client;
mod convert;
pub mod errors;
mod mock;
mod remove_background;

pub use client::{FormPart, HttpClient, HttpResponse, MultipartRequest, ReqwestHttpClient};
pub use convert::ConvertStrategy;
pub use mock::MockHttpClient;
pub use remove_background::RemoveBackgroundStrategy;
