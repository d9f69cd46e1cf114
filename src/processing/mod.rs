pub mod batch;
pub mod compress;
pub mod remote;
pub mod strategy;

pub use batch::{AddReport, BatchCoordinator, Rejection};
pub use compress::CompressStrategy;
pub use remote::{ConvertStrategy, HttpClient, MockHttpClient, RemoveBackgroundStrategy, ReqwestHttpClient};
pub use strategy::{StrategySet, TransformJob, TransformStrategy};
