use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use log::warn;

use super::RequestError;

/// Handle used to collect the outcome of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResponseReceiveKey {
    request_id: u32,
}

impl ResponseReceiveKey {
    pub fn request_id(&self) -> u32 {
        self.request_id
    }
}

enum PendingRequest {
    Waiting { deadline: Instant },
    Done(Result<Vec<u8>, RequestError>),
}

/// Correlation id -> waiter map with per-request deadlines.
///
/// Each request resolves exactly once: by a response, by its deadline
/// passing, or by cancellation.
pub struct RequestTracker {
    next_id: u32,
    pending: HashMap<u32, PendingRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: HashMap::new(),
        }
    }

    /// Starts tracking a new request that expires `timeout` after `now`
    pub fn begin(&mut self, now: Instant, timeout: Duration) -> ResponseReceiveKey {
        let request_id = self.allocate_id();
        self.pending.insert(
            request_id,
            PendingRequest::Waiting {
                deadline: now + timeout,
            },
        );
        ResponseReceiveKey { request_id }
    }

    /// Resolves a waiting request. Late or duplicate responses are refused
    pub fn resolve(
        &mut self,
        request_id: u32,
        result: Result<Vec<u8>, RequestError>,
    ) -> Result<(), RequestError> {
        match self.pending.get_mut(&request_id) {
            Some(state @ PendingRequest::Waiting { .. }) => {
                *state = PendingRequest::Done(result);
                Ok(())
            }
            _ => {
                warn!("dropping response for request {}", request_id);
                Err(RequestError::UnknownRequest { request_id })
            }
        }
    }

    /// Fails every request whose deadline has passed. Returns their ids
    pub fn expire(&mut self, now: Instant) -> Vec<u32> {
        let mut expired = Vec::new();
        for (request_id, state) in self.pending.iter_mut() {
            if let PendingRequest::Waiting { deadline } = state {
                if *deadline <= now {
                    *state = PendingRequest::Done(Err(RequestError::Timeout {
                        request_id: *request_id,
                    }));
                    expired.push(*request_id);
                }
            }
        }
        expired
    }

    /// Takes the outcome of a resolved request. `None` while it is still waiting
    pub fn take(&mut self, key: &ResponseReceiveKey) -> Option<Result<Vec<u8>, RequestError>> {
        if let Some(PendingRequest::Waiting { .. }) = self.pending.get(&key.request_id) {
            return None;
        }
        match self.pending.remove(&key.request_id) {
            Some(PendingRequest::Done(result)) => Some(result),
            _ => None,
        }
    }

    pub fn is_waiting(&self, key: &ResponseReceiveKey) -> bool {
        matches!(
            self.pending.get(&key.request_id),
            Some(PendingRequest::Waiting { .. })
        )
    }

    /// Fails every waiting request with [`RequestError::Cancelled`]
    pub fn cancel_all(&mut self) {
        for (request_id, state) in self.pending.iter_mut() {
            if let PendingRequest::Waiting { .. } = state {
                *state = PendingRequest::Done(Err(RequestError::Cancelled {
                    request_id: *request_id,
                }));
            }
        }
    }

    pub fn waiting_count(&self) -> usize {
        self.pending
            .values()
            .filter(|state| matches!(state, PendingRequest::Waiting { .. }))
            .count()
    }

    fn allocate_id(&mut self) -> u32 {
        loop {
            let request_id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.pending.contains_key(&request_id) {
                return request_id;
            }
        }
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
