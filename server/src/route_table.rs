use std::collections::HashMap;

use log::error;
use thiserror::Error;

use rally_shared::PeerId;

/// Errors raised by request/response routes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("Route '{route}' is already registered")]
    DuplicateRoute { route: String },

    #[error("Route '{route}' is not registered")]
    NotFound { route: String },

    /// Returned by handlers that refuse a request. The reason is sent back to the caller
    #[error("{reason}")]
    Rejected { reason: String },
}

impl RouteError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        RouteError::Rejected {
            reason: reason.into(),
        }
    }
}

pub type RouteHandler = Box<dyn FnMut(PeerId, &[u8]) -> Result<Vec<u8>, RouteError> + Send>;

/// Named request handlers, answered with a `Response` frame
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteHandler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, route: &str, handler: F) -> Result<(), RouteError>
    where
        F: FnMut(PeerId, &[u8]) -> Result<Vec<u8>, RouteError> + Send + 'static,
    {
        if self.routes.contains_key(route) {
            let error = RouteError::DuplicateRoute {
                route: route.to_owned(),
            };
            error!("{}", error);
            return Err(error);
        }
        self.routes.insert(route.to_owned(), Box::new(handler));
        Ok(())
    }

    pub fn unregister(&mut self, route: &str) -> bool {
        self.routes.remove(route).is_some()
    }

    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    pub fn handle(&mut self, from: PeerId, route: &str, payload: &[u8]) -> Result<Vec<u8>, RouteError> {
        let handler = self.routes.get_mut(route).ok_or_else(|| RouteError::NotFound {
            route: route.to_owned(),
        })?;
        handler(from, payload)
    }
}
