mod coordinator;

pub use coordinator::{AddReport, BatchCoordinator, Rejection};
