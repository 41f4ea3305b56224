//! In-memory host simulation
//!
//! Generational slot storage with type-keyed components, capability and
//! marker sets, and a spawn queue that is only materialized when the caller
//! asks for it (`complete_spawns`), which mimics a host that reports spawned
//! actors on a later frame.

use std::any::{Any, TypeId};
use std::fmt;

use glam::Vec3;
use hashbrown::{HashMap, HashSet};

use super::{
    ActorHandle, AttackSpeed, Capability, Component, EntityStore, Health, HostError, Lifetime,
    Marker, MarkerService, Position, SpawnRequest, SpawnService, SpawnTicket, UnitKind, UnitLevel,
    UnitStats,
};

/// Stat template used when creating mobs (directly or through spawn requests)
#[derive(Debug, Clone, PartialEq)]
pub struct MobTemplate {
    pub kind: UnitKind,
    pub level: u32,
    pub max_health: f32,
    pub physical_power: f32,
    pub spell_power: f32,
    pub attack_speed: AttackSpeed,
}

impl MobTemplate {
    pub fn new(kind: i32, max_health: f32) -> Self {
        Self {
            kind: UnitKind(kind),
            level: 30,
            max_health,
            physical_power: 20.0,
            spell_power: 10.0,
            attack_speed: AttackSpeed {
                ability: 1.0,
                primary: 1.0,
            },
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }
}

#[derive(Default)]
struct Slot {
    generation: u32,
    alive: bool,
    components: HashMap<TypeId, Box<dyn Any + Send>>,
    capabilities: HashSet<Capability>,
    markers: HashSet<Marker>,
}

impl Slot {
    fn clear(&mut self) {
        self.alive = false;
        self.components.clear();
        self.capabilities.clear();
        self.markers.clear();
    }
}

/// Single-threaded host used by tests and the admin REPL
#[derive(Default)]
pub struct InMemoryWorld {
    slots: Vec<Slot>,
    free: Vec<u32>,
    templates: HashMap<UnitKind, MobTemplate>,

    /// Requests not yet materialized into actors
    pending_spawns: Vec<SpawnRequest>,
    /// Every request ever accepted, in order
    spawn_log: Vec<SpawnRequest>,
    /// Every handle passed to `destroy`, in order
    destroyed: Vec<ActorHandle>,

    // ─── Fault injection ────────────────────────────────────────────────────
    write_failures: HashSet<(ActorHandle, &'static str)>,
    reject_markers: bool,
    reject_spawns: bool,
}

impl fmt::Debug for InMemoryWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryWorld")
            .field("live_actors", &self.actors().len())
            .field("pending_spawns", &self.pending_spawns.len())
            .finish()
    }
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, actor: ActorHandle) -> Option<&Slot> {
        self.slots
            .get(actor.index as usize)
            .filter(|s| s.alive && s.generation == actor.generation)
    }

    fn slot_mut(&mut self, actor: ActorHandle) -> Result<&mut Slot, HostError> {
        self.slots
            .get_mut(actor.index as usize)
            .filter(|s| s.alive && s.generation == actor.generation)
            .ok_or(HostError::ActorGone { actor })
    }

    // ─── Population ─────────────────────────────────────────────────────────

    /// Create an actor with no components
    pub fn spawn_empty(&mut self) -> ActorHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            return ActorHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            alive: true,
            ..Default::default()
        });
        ActorHandle::new(index, 0)
    }

    /// Create an ordinary mob that passes the promotion capability checks
    pub fn spawn_mob(&mut self, template: &MobTemplate, position: Vec3) -> ActorHandle {
        let actor = self.spawn_empty();
        self.insert(actor, Health::full(template.max_health));
        self.insert(
            actor,
            UnitStats {
                physical_power: template.physical_power,
                spell_power: template.spell_power,
                damage_reduction: 0.0,
            },
        );
        self.insert(actor, template.attack_speed);
        self.insert(actor, UnitLevel(template.level));
        self.insert(actor, Position(position));
        self.insert(actor, template.kind);
        self.grant(actor, Capability::Level);
        self.grant(actor, Capability::Movement);
        actor
    }

    pub fn spawn_player(&mut self, position: Vec3, max_health: f32) -> ActorHandle {
        let actor = self.spawn_empty();
        self.insert(actor, Health::full(max_health));
        self.insert(actor, Position(position));
        self.grant(actor, Capability::Player);
        self.grant(actor, Capability::Level);
        self.grant(actor, Capability::Movement);
        actor
    }

    /// Set a component, bypassing fault injection. Returns false if the actor is gone.
    pub fn insert<C: Component>(&mut self, actor: ActorHandle, value: C) -> bool {
        match self.slot_mut(actor) {
            Ok(slot) => {
                slot.components.insert(TypeId::of::<C>(), Box::new(value));
                true
            }
            Err(_) => false,
        }
    }

    pub fn grant(&mut self, actor: ActorHandle, capability: Capability) -> bool {
        match self.slot_mut(actor) {
            Ok(slot) => {
                slot.capabilities.insert(capability);
                true
            }
            Err(_) => false,
        }
    }

    /// Template used when materializing spawn requests for `template.kind`
    pub fn register_template(&mut self, template: MobTemplate) {
        self.templates.insert(template.kind, template);
    }

    /// All live actor handles, in slot order
    pub fn actors(&self) -> Vec<ActorHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.alive)
            .map(|(i, s)| ActorHandle::new(i as u32, s.generation))
            .collect()
    }

    pub fn position(&self, actor: ActorHandle) -> Option<Vec3> {
        self.read::<Position>(actor).map(|Position(p)| p)
    }

    // ─── Spawning ───────────────────────────────────────────────────────────

    pub fn pending_spawns(&self) -> &[SpawnRequest] {
        &self.pending_spawns
    }

    pub fn spawn_log(&self) -> &[SpawnRequest] {
        &self.spawn_log
    }

    /// Turn every queued request into actors. Returns each new actor with the
    /// ticket its request carried.
    pub fn complete_spawns(&mut self) -> Vec<(ActorHandle, Option<SpawnTicket>)> {
        let requests = std::mem::take(&mut self.pending_spawns);
        let mut spawned = Vec::new();
        for request in requests {
            let template = self
                .templates
                .get(&request.unit)
                .cloned()
                .unwrap_or_else(|| MobTemplate::new(request.unit.0, 100.0));
            for _ in 0..request.count {
                let actor = self.spawn_mob(&template, request.position);
                if let Some(secs) = request.lifetime {
                    self.insert(actor, Lifetime(secs));
                }
                spawned.push((actor, request.ticket));
            }
        }
        spawned
    }

    /// Forget queued requests without creating anything
    pub fn drop_pending_spawns(&mut self) -> usize {
        let dropped = self.pending_spawns.len();
        self.pending_spawns.clear();
        dropped
    }

    pub fn destroyed(&self) -> &[ActorHandle] {
        &self.destroyed
    }

    // ─── Fault injection ────────────────────────────────────────────────────

    /// Make every subsequent `write::<C>` on `actor` fail
    pub fn fail_writes<C: Component>(&mut self, actor: ActorHandle) {
        self.write_failures.insert((actor, C::NAME));
    }

    pub fn reject_markers(&mut self, reject: bool) {
        self.reject_markers = reject;
    }

    pub fn reject_spawns(&mut self, reject: bool) {
        self.reject_spawns = reject;
    }
}

impl EntityStore for InMemoryWorld {
    fn exists(&self, actor: ActorHandle) -> bool {
        self.slot(actor).is_some()
    }

    fn read<C: Component>(&self, actor: ActorHandle) -> Option<C> {
        self.slot(actor)?
            .components
            .get(&TypeId::of::<C>())?
            .downcast_ref::<C>()
            .copied()
    }

    fn write<C: Component>(&mut self, actor: ActorHandle, value: C) -> Result<(), HostError> {
        if self.write_failures.contains(&(actor, C::NAME)) {
            return Err(HostError::Rejected {
                actor,
                operation: "write",
                reason: format!("{} is read-only", C::NAME),
            });
        }
        let slot = self.slot_mut(actor)?;
        slot.components.insert(TypeId::of::<C>(), Box::new(value));
        Ok(())
    }

    fn has_capability(&self, actor: ActorHandle, capability: Capability) -> bool {
        self.slot(actor)
            .is_some_and(|s| s.capabilities.contains(&capability))
    }

    fn add_capability(
        &mut self,
        actor: ActorHandle,
        capability: Capability,
    ) -> Result<(), HostError> {
        self.slot_mut(actor)?.capabilities.insert(capability);
        Ok(())
    }

    fn remove_capability(
        &mut self,
        actor: ActorHandle,
        capability: Capability,
    ) -> Result<(), HostError> {
        self.slot_mut(actor)?.capabilities.remove(&capability);
        Ok(())
    }

    fn destroy(&mut self, actor: ActorHandle) -> Result<(), HostError> {
        let slot = self.slot_mut(actor)?;
        slot.clear();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(actor.index);
        self.destroyed.push(actor);
        Ok(())
    }
}

impl MarkerService for InMemoryWorld {
    fn apply_marker(&mut self, actor: ActorHandle, marker: Marker) -> Result<bool, HostError> {
        if self.reject_markers {
            return Err(HostError::Rejected {
                actor,
                operation: "apply_marker",
                reason: format!("{marker:?} unavailable"),
            });
        }
        Ok(self.slot_mut(actor)?.markers.insert(marker))
    }

    fn remove_marker(&mut self, actor: ActorHandle, marker: Marker) -> Result<(), HostError> {
        self.slot_mut(actor)?.markers.remove(&marker);
        Ok(())
    }

    fn has_marker(&self, actor: ActorHandle, marker: Marker) -> bool {
        self.slot(actor).is_some_and(|s| s.markers.contains(&marker))
    }
}

impl SpawnService for InMemoryWorld {
    fn spawn(&mut self, request: SpawnRequest) -> Result<(), HostError> {
        if self.reject_spawns {
            return Err(HostError::SpawnRejected {
                reason: "spawner disabled".to_string(),
            });
        }
        self.spawn_log.push(request.clone());
        self.pending_spawns.push(request);
        Ok(())
    }
}
