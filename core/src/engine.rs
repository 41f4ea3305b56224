//! Elite engine service object
//!
//! Owns the host, clock, random source, configuration, registry and pending
//! spawn correlator. The lifecycle operations live in their own modules as
//! further `impl EliteEngine` blocks:
//! - `lifecycle::promotion`: promote / try_promote
//! - `lifecycle::demotion`: demote / purge_all / cleanup_stale / deaths
//! - `scheduler`: per-tick affix behaviors and timeouts
//! - `combat`: damage batch hooks
//! - `scanner`: periodic candidate discovery
//!
//! Every entry point takes `&mut self`; the host drives them sequentially from
//! its own update loop.

use elitemobs_types::{EliteConfig, Tier};
use glam::Vec3;
use tracing::{debug, info, warn};

use crate::host::{
    ActorHandle, Capability, Clock, EntityStore, Host, Marker, MarkerService, Position,
    RandomSource, SpawnTicket,
};
use crate::registry::{EliteRecord, EliteRegistry};
use crate::scanner::SpawnScanner;
use crate::spawn::SpawnCorrelator;

/// An elite found by `list_near`
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyElite<'a> {
    pub actor: ActorHandle,
    pub record: &'a EliteRecord,
    pub distance: f32,
}

pub struct EliteEngine<H: Host> {
    pub(crate) host: H,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) rng: Box<dyn RandomSource>,
    pub(crate) config: EliteConfig,
    pub(crate) registry: EliteRegistry,
    pub(crate) spawns: SpawnCorrelator<H>,
    pub(crate) scanner: SpawnScanner,
}

impl<H: Host> EliteEngine<H> {
    pub fn new(
        host: H,
        clock: Box<dyn Clock>,
        rng: Box<dyn RandomSource>,
        config: EliteConfig,
    ) -> Self {
        let spawns = SpawnCorrelator::new(config.spawn_key_space, config.pending_spawn_ttl_secs);
        info!(
            enabled = config.enabled,
            champion = config.champion.spawn_chance,
            warlord = config.warlord.spawn_chance,
            apex = config.apex.spawn_chance,
            "Elite engine initialized"
        );
        Self {
            host,
            clock,
            rng,
            config,
            registry: EliteRegistry::new(),
            spawns,
            scanner: SpawnScanner::default(),
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &EliteConfig {
        &self.config
    }

    /// Replace the configuration. Existing records keep their timers.
    pub fn set_config(&mut self, config: EliteConfig) {
        self.spawns
            .reconfigure(config.spawn_key_space, config.pending_spawn_ttl_secs);
        self.config = config;
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    // ─── Queries ────────────────────────────────────────────────────────────

    pub fn record(&self, actor: ActorHandle) -> Option<&EliteRecord> {
        self.registry.get(actor)
    }

    pub fn is_elite(&self, actor: ActorHandle) -> bool {
        self.registry.contains(actor)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// XP multiplier for an elite (1.0 for ordinary actors)
    pub fn xp_multiplier(&self, actor: ActorHandle) -> f32 {
        self.registry
            .get(actor)
            .map(|r| self.config.tier(r.tier).xp_multiplier)
            .unwrap_or(1.0)
    }

    /// Tracked elites within `radius` of `position`, nearest first.
    /// Actors that are gone or have no position are skipped.
    pub fn list_near(&self, position: Vec3, radius: f32) -> Vec<NearbyElite<'_>> {
        let mut found: Vec<_> = self
            .registry
            .iter()
            .filter(|(actor, _)| self.host.exists(*actor))
            .filter_map(|(actor, record)| {
                let Position(pos) = self.host.read::<Position>(actor)?;
                let distance = pos.distance(position);
                (distance <= radius).then_some(NearbyElite {
                    actor,
                    record,
                    distance,
                })
            })
            .collect();
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found
    }

    /// Nearest ordinary mob (or nearest elite with `elite_only`) to `position`.
    /// Players, named bosses, vendors and minions are never returned.
    pub fn nearest_mob(
        &self,
        candidates: &[ActorHandle],
        position: Vec3,
        elite_only: bool,
    ) -> Option<ActorHandle> {
        candidates
            .iter()
            .copied()
            .filter(|a| self.host.exists(*a))
            .filter(|a| !elite_only || self.is_elite(*a))
            .filter(|a| {
                !self.host.has_capability(*a, Capability::Player)
                    && !self.host.has_capability(*a, Capability::NamedBoss)
                    && !self.host.has_capability(*a, Capability::Vendor)
                    && !self.host.has_capability(*a, Capability::Minion)
            })
            .filter_map(|a| {
                let Position(pos) = self.host.read::<Position>(a)?;
                Some((a, pos.distance(position)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(a, _)| a)
    }

    // ─── Host notifications ─────────────────────────────────────────────────

    /// The host reports a newly created actor and the ticket of the request
    /// that produced it. Returns true when a pending callback ran.
    pub fn on_actor_spawned(&mut self, actor: ActorHandle, ticket: Option<SpawnTicket>) -> bool {
        let Some(ticket) = ticket else {
            return false;
        };
        self.spawns.on_actor_spawned(&mut self.host, actor, ticket)
    }

    /// Pending post-spawn callbacks still waiting for their actor
    pub fn pending_spawns(&self) -> usize {
        self.spawns.pending_count()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Best-effort host calls
// ─────────────────────────────────────────────────────────────────────────────

/// Apply a marker; failures are logged and reported as false, never raised.
pub(crate) fn try_apply_marker<H: MarkerService>(
    host: &mut H,
    actor: ActorHandle,
    marker: Marker,
) -> bool {
    match host.apply_marker(actor, marker) {
        Ok(applied) => applied,
        Err(err) => {
            debug!(%actor, ?marker, error = %err, "Marker apply failed");
            false
        }
    }
}

pub(crate) fn try_remove_marker<H: MarkerService>(
    host: &mut H,
    actor: ActorHandle,
    marker: Marker,
) -> bool {
    match host.remove_marker(actor, marker) {
        Ok(()) => true,
        Err(err) => {
            debug!(%actor, ?marker, error = %err, "Marker remove failed");
            false
        }
    }
}

/// Re-apply the tier identity marker when the aura toggle allows it
pub(crate) fn apply_tier_identity<H: MarkerService>(
    host: &mut H,
    config: &EliteConfig,
    actor: ActorHandle,
    tier: Tier,
) {
    if config.toggles.apply_tier_aura {
        try_apply_marker(host, actor, Marker::tier_identity(tier));
    }
}

pub(crate) fn try_exclude_from_persistence<H: EntityStore>(host: &mut H, actor: ActorHandle) -> bool {
    if host.has_capability(actor, Capability::ExcludeFromPersistence) {
        return true;
    }
    match host.add_capability(actor, Capability::ExcludeFromPersistence) {
        Ok(()) => true,
        Err(err) => {
            warn!(%actor, error = %err, "Could not exclude elite from persistence");
            false
        }
    }
}
