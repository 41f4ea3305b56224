//! Demotion, purge, death and stale-record cleanup

use elitemobs_types::{Affix, EliteConfig};
use tracing::{debug, info, trace, warn};

use super::FRENZIED_ATTACK_SPEED;
use crate::engine::{EliteEngine, try_remove_marker};
use crate::host::{ActorHandle, AttackSpeed, EntityStore, Health, Host, HostError, Marker, UnitStats};
use crate::registry::EliteRecord;

fn restore_health<H: EntityStore>(
    host: &mut H,
    actor: ActorHandle,
    record: &EliteRecord,
) -> Result<(), HostError> {
    let max = record.baseline.max_health;
    if max > 0.0
        && let Some(health) = host.read::<Health>(actor)
    {
        host.write(
            actor,
            Health {
                current: health.current.min(max),
                max,
            },
        )?;
    }
    Ok(())
}

/// Power is only restored when a baseline was captured. Damage reduction is
/// zeroed unless `restore_damage_reduction` is set.
fn restore_stats<H: EntityStore>(
    host: &mut H,
    config: &EliteConfig,
    actor: ActorHandle,
    record: &EliteRecord,
) -> Result<(), HostError> {
    let baseline = &record.baseline;
    if let Some(mut stats) = host.read::<UnitStats>(actor) {
        if baseline.physical_power > 0.0 {
            stats.physical_power = baseline.physical_power;
        }
        if baseline.spell_power > 0.0 {
            stats.spell_power = baseline.spell_power;
        }
        stats.damage_reduction = if config.restore_damage_reduction {
            baseline.damage_reduction
        } else {
            0.0
        };
        host.write(actor, stats)?;
    }
    Ok(())
}

fn restore_attack_speed<H: EntityStore>(
    host: &mut H,
    actor: ActorHandle,
    record: &EliteRecord,
) -> Result<(), HostError> {
    let frenzied = record.affix_count(Affix::Frenzied);
    if frenzied > 0
        && let Some(speed) = host.read::<AttackSpeed>(actor)
    {
        let factor = FRENZIED_ATTACK_SPEED.powi(frenzied as i32);
        host.write(
            actor,
            AttackSpeed {
                ability: speed.ability / factor,
                primary: speed.primary / factor,
            },
        )?;
    }
    Ok(())
}

/// Write the record's baseline back onto the actor. Each step is attempted
/// even if an earlier one failed.
fn restore_baseline<H: EntityStore>(
    host: &mut H,
    config: &EliteConfig,
    actor: ActorHandle,
    record: &EliteRecord,
) {
    let steps = [
        ("health", restore_health(host, actor, record)),
        ("stats", restore_stats(host, config, actor, record)),
        ("attack_speed", restore_attack_speed(host, actor, record)),
    ];
    for (step, result) in steps {
        if let Err(err) = result {
            warn!(%actor, tier = %record.tier, step, error = %err, "Baseline restore failed");
        }
    }
}

impl<H: Host> EliteEngine<H> {
    /// Revert an elite to its baseline and stop tracking it.
    ///
    /// Returns false only when the actor was not elite. A stale handle still
    /// has its record dropped; restoration is skipped.
    pub fn demote(&mut self, actor: ActorHandle) -> bool {
        let Some(record) = self.registry.remove(actor) else {
            return false;
        };

        if !self.host.exists(actor) {
            trace!(%actor, "Dropped record for vanished elite");
            return true;
        }

        restore_baseline(&mut self.host, &self.config, actor, &record);
        for marker in Marker::ELITE_MARKERS {
            try_remove_marker(&mut self.host, actor, marker);
        }

        info!(
            %actor,
            tier = %record.tier,
            affixes = %record.affix_summary(),
            remaining = self.registry.len(),
            "Demoted elite"
        );
        true
    }

    /// Demote every live elite. Records of vanished actors are dropped
    /// without being counted. Returns how many actors were demoted.
    pub fn purge_all(&mut self) -> usize {
        let mut demoted = 0;
        for actor in self.registry.handles() {
            if !self.host.exists(actor) {
                self.registry.remove(actor);
                continue;
            }
            if self.demote(actor) {
                demoted += 1;
            }
        }
        if demoted > 0 {
            info!(demoted, "Purged all elites");
        }
        demoted
    }

    /// Drop records whose actors no longer exist. Nothing is restored.
    pub fn cleanup_stale(&mut self) -> usize {
        if self.registry.is_empty() {
            return 0;
        }
        let host = &self.host;
        let dropped = self.registry.retain_live(|actor| host.exists(actor));
        if dropped > 0 {
            debug!(dropped, remaining = self.registry.len(), "Cleaned up stale elites");
        }
        dropped
    }

    /// The host reports that `actor` died. Its record is dropped without
    /// restoring stats and returned to the caller (for loot or XP hooks).
    pub fn on_death(&mut self, actor: ActorHandle) -> Option<EliteRecord> {
        let record = self.registry.remove(actor)?;
        info!(
            %actor,
            tier = %record.tier,
            affixes = %record.affix_summary(),
            remaining = self.registry.len(),
            "Elite slain"
        );
        Some(record)
    }

    /// Batch form of `on_death`. Returns how many of the dead were elite.
    pub fn on_deaths(&mut self, actors: &[ActorHandle]) -> usize {
        actors
            .iter()
            .filter(|actor| self.on_death(**actor).is_some())
            .count()
    }
}
