mod error;
mod request_tracker;

pub use error::RequestError;
pub use request_tracker::{RequestTracker, ResponseReceiveKey};
