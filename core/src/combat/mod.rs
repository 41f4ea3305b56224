//! Reactive affixes driven by damage events
//!
//! For each event the attacking elite is resolved through the ownership
//! chain (source, its owner, its owner's owner), so projectiles and summons
//! count as their elite master.
//!
//! - Attacker affixes: Vampiric heal, Chilling freeze
//! - Target affixes: Thorns reflect, Summoner adds


use elitemobs_types::Affix;
use tracing::{info, trace, warn};

use crate::engine::{EliteEngine, try_apply_marker};
use crate::host::{
    ActorHandle, Capability, EntityStore, Health, Host, HostError, Marker, Position, SpawnRequest,
};

/// Fraction of max health a Vampiric elite heals per hit dealt
pub const VAMPIRIC_HEAL_FRACTION: f32 = 0.02;
/// A hit freezes its target when the roll is at or below this
pub const CHILLING_CHANCE: f64 = 0.35;
/// Fraction of the Thorns elite's max health reflected per hit taken
pub const THORNS_REFLECT_FRACTION: f32 = 0.03;
pub const SUMMONER_ADD_COUNT: u32 = 2;

/// One damage instance reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// The actor that dealt the damage (may be a projectile or summon)
    pub source: ActorHandle,
    pub target: ActorHandle,
}

/// Walk `source -> owner -> owner's owner`, returning the last existing link
fn owner_root<H: EntityStore>(host: &H, source: ActorHandle) -> ActorHandle {
    let mut current = source;
    for _ in 0..2 {
        match host.owner_of(current) {
            Some(owner) => current = owner,
            None => break,
        }
    }
    current
}

fn log_hook_failure(affix: Affix, event: DamageEvent, result: Result<(), HostError>) {
    if let Err(err) = result {
        warn!(
            source = %event.source,
            target = %event.target,
            %affix,
            error = %err,
            "Combat hook failed"
        );
    }
}

impl<H: Host> EliteEngine<H> {
    /// The elite responsible for damage dealt by `source`, if any
    pub fn resolve_attacker(&self, source: ActorHandle) -> Option<ActorHandle> {
        let mut current = source;
        for depth in 0..3 {
            if depth > 0 {
                current = self.host.owner_of(current)?;
            }
            if self.registry.contains(current) {
                return Some(current);
            }
        }
        None
    }

    /// Run the combat hooks for a batch of damage events. Each affix fires
    /// independently: a failing hook is logged and the rest still run.
    pub fn on_damage_batch(&mut self, events: &[DamageEvent]) {
        for event in events {
            self.on_damage(*event);
        }
    }

    fn on_damage(&mut self, event: DamageEvent) {
        if let Some(attacker) = self.resolve_attacker(event.source)
            && let Some(record) = self.registry.get(attacker)
        {
            let affixes = record.affixes.clone();
            for affix in affixes {
                let result = match affix {
                    Affix::Vampiric => self.vampiric_heal(attacker),
                    Affix::Chilling => {
                        self.chilling_proc(event.target);
                        Ok(())
                    }
                    _ => Ok(()),
                };
                log_hook_failure(affix, event, result);
            }
        }

        if let Some(record) = self.registry.get(event.target) {
            let affixes = record.affixes.clone();
            for affix in affixes {
                let result = match affix {
                    Affix::Thorns => self.thorns_reflect(event.source, event.target),
                    Affix::Summoner => self.summoner_spawn(event.target),
                    _ => Ok(()),
                };
                log_hook_failure(affix, event, result);
            }
        }
    }

    fn vampiric_heal(&mut self, elite: ActorHandle) -> Result<(), HostError> {
        let Some(health) = self.host.read::<Health>(elite) else {
            return Ok(());
        };
        let healed = (health.current + health.max * VAMPIRIC_HEAL_FRACTION).min(health.max);
        self.host.write(
            elite,
            Health {
                current: healed,
                ..health
            },
        )
    }

    fn chilling_proc(&mut self, target: ActorHandle) {
        if self.rng.uniform01() > CHILLING_CHANCE || !self.host.exists(target) {
            return;
        }
        if try_apply_marker(&mut self.host, target, Marker::Freeze) {
            trace!(%target, "Chilling froze target");
        }
    }

    fn thorns_reflect(&mut self, source: ActorHandle, elite: ActorHandle) -> Result<(), HostError> {
        let attacker = owner_root(&self.host, source);
        if !self.host.has_capability(attacker, Capability::Player) {
            return Ok(());
        }
        let (Some(victim), Some(thorns)) = (
            self.host.read::<Health>(attacker),
            self.host.read::<Health>(elite),
        ) else {
            return Ok(());
        };

        let reflected = thorns.max * THORNS_REFLECT_FRACTION;
        let current = (victim.current - reflected).max(1.0).min(victim.current);
        self.host.write(attacker, Health { current, ..victim })
    }

    fn summoner_spawn(&mut self, elite: ActorHandle) -> Result<(), HostError> {
        let Some(record) = self.registry.get_mut(elite) else {
            return Ok(());
        };
        if record.timers.summoner_triggered {
            return Ok(());
        }
        record.timers.summoner_triggered = true;

        let unit = record.baseline.unit_kind.or_else(|| self.host.read(elite));
        let (Some(unit), Some(Position(position))) = (unit, self.host.read::<Position>(elite))
        else {
            return Ok(());
        };

        self.host.spawn(SpawnRequest {
            unit,
            position,
            count: SUMMONER_ADD_COUNT,
            lifetime: None,
            ticket: None,
        })?;
        info!(%elite, unit = unit.0, count = SUMMONER_ADD_COUNT, "Summoner called adds");
        Ok(())
    }
}
