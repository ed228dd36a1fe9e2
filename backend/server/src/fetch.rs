//! Fetch bookkeeping shared by the read-side components.
//!
//! Each component has at most one read in flight. Activating again or disposing the component
//! invalidates the outstanding [`Ticket`], and a late result carrying a stale ticket is dropped
//! instead of overwriting newer state.
//!
//! HTTP handlers build a component, load it once and drop it, so they never call `dispose` or
//! `DonationPage::navigate`. Both stay for hosts that keep a component alive across parameter
//! changes, and the late-resolution tests drive them.
use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Phase<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(StoreError),
}

#[derive(Debug)]
pub struct Slot<T> {
    generation: u64,
    disposed: bool,
    phase: Phase<T>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            disposed: false,
            phase: Phase::Idle,
        }
    }
}

impl<T> Slot<T> {
    /// Starts a new read, superseding any read still in flight.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        if !self.disposed {
            self.phase = Phase::Loading;
        }

        Ticket(self.generation)
    }

    /// Returns whether the result was applied.
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T, StoreError>) -> bool {
        if self.disposed || ticket.0 != self.generation {
            return false;
        }

        self.phase = match result {
            Ok(value) => Phase::Ready(value),
            Err(err) => Phase::Failed(err),
        };

        true
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match &self.phase {
            Phase::Ready(value) => Some(value),
            _ => None,
        }
    }
}
