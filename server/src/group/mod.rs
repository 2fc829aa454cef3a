mod error;
mod group;
mod group_registry;

pub use error::{JoinError, LeaveError, TargetError};
pub use group::Group;
pub use group_registry::{Departure, GroupRegistry};
