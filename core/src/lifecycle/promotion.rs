//! Promotion as a staged transaction
//!
//! 1. **Plan**: read every component promotion touches and compute the
//!    target values. Nothing is written yet.
//! 2. **Commit**: write the targets in order. If any write fails, the writes
//!    already made are reverted from the plan's "before" values.
//! 3. **Register**: only a fully committed plan becomes an `EliteRecord`.
//!
//! Markers and the persistence exclusion are applied after the commit and
//! never fail a promotion.

use elitemobs_types::{Affix, EliteConfig, Tier};
use tracing::{debug, info, warn};

use super::{FIRST_DECOY_DELAY_SECS, FRENZIED_ATTACK_SPEED, IRONHIDE_DAMAGE_REDUCTION};
use crate::engine::{EliteEngine, apply_tier_identity, try_apply_marker, try_exclude_from_persistence};
use crate::error::PromotionError;
use crate::host::{
    ActorHandle, AttackSpeed, Capability, EntityStore, Health, Host, HostError, Marker, UnitKind,
    UnitStats,
};
use crate::registry::{BaselineStats, EliteRecord};
use crate::selector::TierSelector;

/// Capabilities that rule an actor out of automatic promotion
const EXCLUDED_CAPABILITIES: [Capability; 4] = [
    Capability::Player,
    Capability::NamedBoss,
    Capability::Vendor,
    Capability::Minion,
];

/// A single component write with the value it replaces
#[derive(Debug, Clone, Copy)]
enum StagedWrite {
    Health { before: Health, after: Health },
    Stats { before: UnitStats, after: UnitStats },
    AttackSpeed { before: AttackSpeed, after: AttackSpeed },
}

impl StagedWrite {
    fn apply<H: EntityStore>(&self, host: &mut H, actor: ActorHandle) -> Result<(), HostError> {
        match *self {
            Self::Health { after, .. } => host.write(actor, after),
            Self::Stats { after, .. } => host.write(actor, after),
            Self::AttackSpeed { after, .. } => host.write(actor, after),
        }
    }

    fn revert<H: EntityStore>(&self, host: &mut H, actor: ActorHandle) -> Result<(), HostError> {
        match *self {
            Self::Health { before, .. } => host.write(actor, before),
            Self::Stats { before, .. } => host.write(actor, before),
            Self::AttackSpeed { before, .. } => host.write(actor, before),
        }
    }
}

#[derive(Debug)]
struct PromotionPlan {
    actor: ActorHandle,
    tier: Tier,
    affixes: Vec<Affix>,
    baseline: BaselineStats,
    writes: Vec<StagedWrite>,
}

impl PromotionPlan {
    fn build<H: EntityStore>(
        host: &H,
        config: &EliteConfig,
        actor: ActorHandle,
        tier: Tier,
        affixes: Vec<Affix>,
    ) -> Result<Self, PromotionError> {
        if !host.exists(actor) {
            return Err(PromotionError::ActorGone { actor });
        }

        let settings = config.tier(tier);
        let health = host.read::<Health>(actor);
        let stats = host.read::<UnitStats>(actor);
        let speed = host.read::<AttackSpeed>(actor);

        let baseline = BaselineStats {
            max_health: health.map_or(0.0, |h| h.max),
            physical_power: stats.map_or(0.0, |s| s.physical_power),
            spell_power: stats.map_or(0.0, |s| s.spell_power),
            damage_reduction: stats.map_or(0.0, |s| s.damage_reduction),
            unit_kind: host.read::<UnitKind>(actor),
        };

        let mut writes = Vec::with_capacity(3);

        if let Some(before) = health {
            let after = Health::full(before.max * (1.0 + settings.hp_multiplier));
            writes.push(StagedWrite::Health { before, after });
        }

        if let Some(before) = stats {
            let dmg = 1.0 + settings.dmg_multiplier;
            let ironhide = affixes.iter().filter(|a| **a == Affix::Ironhide).count() as f32;
            let after = UnitStats {
                physical_power: before.physical_power * dmg,
                spell_power: before.spell_power * dmg,
                damage_reduction: before.damage_reduction + ironhide * IRONHIDE_DAMAGE_REDUCTION,
            };
            writes.push(StagedWrite::Stats { before, after });
        }

        let frenzied = affixes.iter().filter(|a| **a == Affix::Frenzied).count();
        if let Some(before) = speed
            && frenzied > 0
        {
            let factor = FRENZIED_ATTACK_SPEED.powi(frenzied as i32);
            let after = AttackSpeed {
                ability: before.ability * factor,
                primary: before.primary * factor,
            };
            writes.push(StagedWrite::AttackSpeed { before, after });
        }

        Ok(Self {
            actor,
            tier,
            affixes,
            baseline,
            writes,
        })
    }

    /// Write every staged value, or none of them.
    fn commit<H: EntityStore>(&self, host: &mut H) -> Result<(), PromotionError> {
        for (i, write) in self.writes.iter().enumerate() {
            if let Err(source) = write.apply(host, self.actor) {
                for done in self.writes[..i].iter().rev() {
                    if let Err(err) = done.revert(host, self.actor) {
                        warn!(actor = %self.actor, error = %err, "Rollback write failed");
                    }
                }
                return Err(PromotionError::Commit {
                    actor: self.actor,
                    source,
                });
            }
        }
        Ok(())
    }
}

impl<H: Host> EliteEngine<H> {
    /// Automatic promotion path used by the scanner.
    ///
    /// Checks that the system is enabled and the actor is an ordinary,
    /// untracked mob, then rolls a tier. Returns true if the actor became elite.
    pub fn try_promote(&mut self, actor: ActorHandle) -> bool {
        if !self.config.enabled || self.registry.contains(actor) {
            return false;
        }
        if !self.is_promotion_candidate(actor) {
            return false;
        }

        let Some(tier) = TierSelector::new(&self.config).roll_tier(self.rng.as_mut()) else {
            return false;
        };
        self.promote(actor, tier, None)
    }

    /// Whether the actor looks like an ordinary mob: it exists, levels, moves,
    /// and is not a player, named boss, vendor or minion.
    pub fn is_promotion_candidate(&self, actor: ActorHandle) -> bool {
        self.host.exists(actor)
            && self.host.has_capability(actor, Capability::Level)
            && self.host.has_capability(actor, Capability::Movement)
            && !EXCLUDED_CAPABILITIES
                .iter()
                .any(|c| self.host.has_capability(actor, *c))
    }

    /// Promote `actor` to `tier`, skipping the candidate checks.
    ///
    /// `forced_affixes` is used verbatim when given; otherwise the tier's
    /// affix count is rolled. An actor that is already elite loses its old
    /// record without restoration, so repeated forced promotions compound.
    pub fn promote(
        &mut self,
        actor: ActorHandle,
        tier: Tier,
        forced_affixes: Option<Vec<Affix>>,
    ) -> bool {
        match self.promote_staged(actor, tier, forced_affixes) {
            Ok(()) => true,
            Err(err) => {
                warn!(%actor, %tier, error = %err, "Promotion failed");
                false
            }
        }
    }

    fn promote_staged(
        &mut self,
        actor: ActorHandle,
        tier: Tier,
        forced_affixes: Option<Vec<Affix>>,
    ) -> Result<(), PromotionError> {
        let now = self.clock.now();
        let Self {
            host,
            rng,
            config,
            registry,
            ..
        } = self;

        let affixes = match forced_affixes {
            Some(affixes) => affixes,
            None => TierSelector::new(config).roll_affixes(
                tier,
                config.tier(tier).affix_count,
                rng.as_mut(),
            ),
        };

        let plan = PromotionPlan::build(host, config, actor, tier, affixes)?;
        plan.commit(host)?;

        apply_tier_identity(host, config, actor, plan.tier);
        if config.toggles.apply_bolstering && plan.affixes.contains(&Affix::Bolstering) {
            try_apply_marker(host, actor, Marker::Bolstering);
        }
        if config.toggles.exclude_from_persistence {
            try_exclude_from_persistence(host, actor);
        }

        let mut record = EliteRecord::new(plan.tier, plan.affixes, plan.baseline, now);
        if record.has_affix(Affix::Illusionist) {
            record.timers.next_decoy_time = now + FIRST_DECOY_DELAY_SECS;
        }

        let summary = record.affix_summary();
        if registry.insert(actor, record).is_some() {
            debug!(%actor, "Replaced existing elite record");
        }
        info!(
            %actor,
            %tier,
            affixes = %summary,
            kind = ?plan.baseline.unit_kind.map(|UnitKind(k)| k),
            "Promoted to elite"
        );
        Ok(())
    }
}
