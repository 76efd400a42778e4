use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies the selection a fetch was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Counter bumped on every collection switch. A fetch holds the ticket that
/// was current when it started and only applies its result if that ticket is
/// still current when it resolves.
#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Ticket {
        Ticket(self.current.load(Ordering::SeqCst))
    }

    pub fn advance(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current() == ticket
    }
}
