//! Deferred spawn correlation
//!
//! Spawn requests complete on a later host frame. Each request carries a
//! random `SpawnTicket`; when the host reports an actor with that ticket the
//! pending callback runs once against the new actor.

mod correlator;

pub use correlator::{MAX_TICKET_ATTEMPTS, SpawnCallback, SpawnCorrelator};
