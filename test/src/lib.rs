//! In-memory transport and harness helpers for end-to-end tests of the
//! rally server and client.


pub use helpers::*;
pub use local_socket::{LocalClientSocket, LocalHub, LocalServerSocket};
