mod error;
mod frame;
mod frame_cipher;
mod route_header;

pub use error::FrameError;
pub use frame::{Frame, ResponseStatus};
pub use frame_cipher::{open_frame, seal_frame};
pub use route_header::RouteHeader;
