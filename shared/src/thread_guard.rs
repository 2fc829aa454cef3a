use std::thread::{self, ThreadId};

/// Remembers the thread that created a session and asserts, in debug
/// builds, that registry mutation stays on it
#[derive(Clone, Debug)]
pub struct ThreadGuard {
    owner: ThreadId,
}

impl ThreadGuard {
    pub fn new() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn is_owner(&self) -> bool {
        thread::current().id() == self.owner
    }

    #[track_caller]
    pub fn check(&self) {
        debug_assert!(
            self.is_owner(),
            "session state mutated off its main thread ({:?})",
            self.owner
        );
    }
}

impl Default for ThreadGuard {
    fn default() -> Self {
        Self::new()
    }
}
