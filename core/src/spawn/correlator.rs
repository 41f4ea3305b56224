use std::fmt;

use glam::Vec3;
use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use crate::error::CorrelatorError;
use crate::host::{
    ActorHandle, EntityStore, HostError, Lifetime, RandomSource, SpawnRequest, SpawnService,
    SpawnTicket, UnitKind,
};

/// Ticket draws before giving up on finding a free one
pub const MAX_TICKET_ATTEMPTS: u32 = 10;

/// Runs once against the spawned actor
pub type SpawnCallback<H> = Box<dyn FnOnce(ActorHandle, &mut H) -> Result<(), HostError> + Send>;

struct PendingSpawn<H> {
    lifetime: Option<f32>,
    on_ready: SpawnCallback<H>,
    issued_at: f64,
}

pub struct SpawnCorrelator<H> {
    pending: HashMap<SpawnTicket, PendingSpawn<H>>,
    key_space: u64,
    ttl_secs: f64,
}

impl<H> fmt::Debug for SpawnCorrelator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnCorrelator")
            .field("pending", &self.pending.len())
            .field("key_space", &self.key_space)
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl<H: EntityStore + SpawnService> SpawnCorrelator<H> {
    pub fn new(key_space: u64, ttl_secs: f64) -> Self {
        Self {
            pending: HashMap::new(),
            key_space: key_space.max(1),
            ttl_secs,
        }
    }

    pub fn reconfigure(&mut self, key_space: u64, ttl_secs: f64) {
        self.key_space = key_space.max(1);
        self.ttl_secs = ttl_secs;
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn next_ticket(&self, rng: &mut dyn RandomSource) -> Result<SpawnTicket, CorrelatorError> {
        let bound = usize::try_from(self.key_space).unwrap_or(usize::MAX);
        for _ in 0..MAX_TICKET_ATTEMPTS {
            let ticket = SpawnTicket(rng.uniform_int(bound) as u64);
            if !self.pending.contains_key(&ticket) {
                return Ok(ticket);
            }
        }
        Err(CorrelatorError::KeySpaceExhausted {
            attempts: MAX_TICKET_ATTEMPTS,
        })
    }

    /// Request one `unit` at `position` and run `on_ready` once it exists.
    ///
    /// `lifetime` is re-asserted on the actor before the callback runs
    /// (None leaves the unit's own lifetime rules in place).
    pub fn spawn_with_callback(
        &mut self,
        host: &mut H,
        rng: &mut dyn RandomSource,
        now: f64,
        unit: UnitKind,
        position: Vec3,
        lifetime: Option<f32>,
        on_ready: SpawnCallback<H>,
    ) -> Result<SpawnTicket, CorrelatorError> {
        let ticket = self.next_ticket(rng)?;
        host.spawn(SpawnRequest {
            unit,
            position,
            count: 1,
            lifetime,
            ticket: Some(ticket),
        })?;

        self.pending.insert(
            ticket,
            PendingSpawn {
                lifetime,
                on_ready,
                issued_at: now,
            },
        );
        trace!(?ticket, unit = unit.0, "Spawn requested");
        Ok(ticket)
    }

    /// Match a spawned actor to its pending request. Returns true when a
    /// callback ran (successfully or not); unknown tickets are ignored.
    pub fn on_actor_spawned(&mut self, host: &mut H, actor: ActorHandle, ticket: SpawnTicket) -> bool {
        let Some(pending) = self.pending.remove(&ticket) else {
            return false;
        };

        if let Some(secs) = pending.lifetime
            && let Err(err) = host.write(actor, Lifetime(secs))
        {
            debug!(%actor, error = %err, "Could not set spawned actor lifetime");
        }
        if let Err(err) = (pending.on_ready)(actor, host) {
            warn!(%actor, ?ticket, error = %err, "Post-spawn callback failed");
        }
        true
    }

    /// Drop pending requests older than the TTL. Returns how many went.
    pub fn sweep_expired(&mut self, now: f64) -> usize {
        let ttl = self.ttl_secs;
        let before = self.pending.len();
        self.pending.retain(|_, p| now - p.issued_at <= ttl);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(dropped, "Expired unmatched spawn requests");
        }
        dropped
    }
}
