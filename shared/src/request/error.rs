use thiserror::Error;

/// Failure outcomes of a request/response exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// No response arrived within the configured window
    #[error("Request {request_id} timed out waiting for a response")]
    Timeout { request_id: u32 },

    /// The server has no handler registered for the route
    #[error("Route '{route}' is not registered on the server")]
    RouteNotFound { route: String },

    /// The route handler refused or failed the request
    #[error("Request was rejected: {reason}")]
    Rejected { reason: String },

    /// A response arrived for an id that is not pending
    #[error("Received a response for unknown or already resolved request {request_id}")]
    UnknownRequest { request_id: u32 },

    /// The connection closed before a response arrived
    #[error("Request {request_id} was cancelled because the connection closed")]
    Cancelled { request_id: u32 },
}
