//! Host collaborators
//!
//! The engine never owns the simulation. Everything it reads or mutates on an
//! actor goes through the traits in this module:
//! - **EntityStore**: typed component access, capabilities, destruction
//! - **MarkerService**: idempotent apply/remove of named markers (buff-like)
//! - **SpawnService**: fire-and-forget unit spawn requests
//! - **Clock / RandomSource**: time and randomness
//!
//! `InMemoryWorld` implements all of them for tests and the admin REPL.

mod error;
mod memory;
mod random;

pub use error::HostError;
pub use memory::{InMemoryWorld, MobTemplate};
pub use random::{ManualClock, MonotonicClock, SeededRandom};

use std::fmt;

use glam::Vec3;

// ─────────────────────────────────────────────────────────────────────────────
// Handles
// ─────────────────────────────────────────────────────────────────────────────

/// Stable actor identifier: slot index plus generation.
///
/// A handle whose generation no longer matches the store's slot refers to an
/// actor that is gone, even if the index has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorHandle {
    pub index: u32,
    pub generation: u32,
}

impl ActorHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────────────────────────────────────

/// Plain-data component stored on an actor.
pub trait Component: Copy + Send + 'static {
    const NAME: &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    /// Current health as a fraction of max (0 when max is not positive)
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitStats {
    pub physical_power: f32,
    pub spell_power: f32,
    pub damage_reduction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackSpeed {
    pub ability: f32,
    pub primary: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitLevel(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

/// The actor that created or controls this one (summons, projectiles).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner(pub ActorHandle);

/// Host unit template identifier (what kind of creature this is).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitKind(pub i32);

/// Seconds until the host despawns the actor on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lifetime(pub f32);

impl Component for Health {
    const NAME: &'static str = "Health";
}
impl Component for UnitStats {
    const NAME: &'static str = "UnitStats";
}
impl Component for AttackSpeed {
    const NAME: &'static str = "AttackSpeed";
}
impl Component for UnitLevel {
    const NAME: &'static str = "UnitLevel";
}
impl Component for Position {
    const NAME: &'static str = "Position";
}
impl Component for Owner {
    const NAME: &'static str = "Owner";
}
impl Component for UnitKind {
    const NAME: &'static str = "UnitKind";
}
impl Component for Lifetime {
    const NAME: &'static str = "Lifetime";
}

/// Tag-like facts about an actor that gate promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Level,
    Movement,
    Player,
    /// Named boss or quest unit
    NamedBoss,
    Vendor,
    /// Summon or minion of another actor
    Minion,
    /// Host must not write this actor to persistent storage
    ExcludeFromPersistence,
}

// ─────────────────────────────────────────────────────────────────────────────
// Markers
// ─────────────────────────────────────────────────────────────────────────────

/// Externally managed visual or mechanical effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    ChampionAura,
    WarlordAura,
    ApexAura,
    Shield,
    Stealth,
    Bolstering,
    Freeze,
    /// Set by the host while the actor is fighting
    InCombat,
}

impl Marker {
    /// Markers stripped from an actor when it stops being elite
    pub const ELITE_MARKERS: [Marker; 6] = [
        Marker::ChampionAura,
        Marker::WarlordAura,
        Marker::ApexAura,
        Marker::Shield,
        Marker::Stealth,
        Marker::Bolstering,
    ];

    pub fn tier_identity(tier: elitemobs_types::Tier) -> Marker {
        use elitemobs_types::Tier;
        match tier {
            Tier::Champion => Marker::ChampionAura,
            Tier::Warlord => Marker::WarlordAura,
            Tier::Apex => Marker::ApexAura,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Spawning
// ─────────────────────────────────────────────────────────────────────────────

/// Correlation token carried by a spawn request and echoed back on the
/// spawned actor's notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnTicket(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub unit: UnitKind,
    pub position: Vec3,
    pub count: u32,
    /// None = the unit's own lifetime rules
    pub lifetime: Option<f32>,
    pub ticket: Option<SpawnTicket>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

pub trait EntityStore {
    /// False once the handle's generation is stale
    fn exists(&self, actor: ActorHandle) -> bool;

    fn read<C: Component>(&self, actor: ActorHandle) -> Option<C>;

    fn write<C: Component>(&mut self, actor: ActorHandle, value: C) -> Result<(), HostError>;

    fn has<C: Component>(&self, actor: ActorHandle) -> bool {
        self.read::<C>(actor).is_some()
    }

    fn has_capability(&self, actor: ActorHandle, capability: Capability) -> bool;

    fn add_capability(&mut self, actor: ActorHandle, capability: Capability)
    -> Result<(), HostError>;

    fn remove_capability(
        &mut self,
        actor: ActorHandle,
        capability: Capability,
    ) -> Result<(), HostError>;

    fn destroy(&mut self, actor: ActorHandle) -> Result<(), HostError>;

    /// Owner of `actor`, if it has one that still exists
    fn owner_of(&self, actor: ActorHandle) -> Option<ActorHandle> {
        self.read::<Owner>(actor)
            .map(|Owner(owner)| owner)
            .filter(|owner| self.exists(*owner))
    }
}

pub trait MarkerService {
    /// Returns false when the marker was already present
    fn apply_marker(&mut self, actor: ActorHandle, marker: Marker) -> Result<bool, HostError>;

    /// Removing an absent marker is a no-op
    fn remove_marker(&mut self, actor: ActorHandle, marker: Marker) -> Result<(), HostError>;

    fn has_marker(&self, actor: ActorHandle, marker: Marker) -> bool;
}

pub trait SpawnService {
    /// Queue a spawn. Resulting actors are reported later by the host.
    fn spawn(&mut self, request: SpawnRequest) -> Result<(), HostError>;
}

/// Everything the engine needs from the simulation it runs inside.
pub trait Host: EntityStore + MarkerService + SpawnService + 'static {}

impl<T: EntityStore + MarkerService + SpawnService + 'static> Host for T {}

/// Monotonic time source in seconds
pub trait Clock: Send {
    fn now(&self) -> f64;
}

pub trait RandomSource: Send {
    /// Uniform draw in [0, 1)
    fn uniform01(&mut self) -> f64;

    /// Uniform integer in [0, bound); 0 when bound is 0
    fn uniform_int(&mut self, bound: usize) -> usize;
}
