use std::sync::atomic::{AtomicU64, Ordering};

/// Stamp handed out by [`GenerationGate::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Monotonic counter used to recognise work that was superseded while it
/// was suspended.
#[derive(Debug, Default)]
pub struct GenerationGate {
    current: AtomicU64,
}

impl GenerationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation; every earlier ticket becomes stale.
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Invalidates outstanding tickets without starting new work.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }
}
