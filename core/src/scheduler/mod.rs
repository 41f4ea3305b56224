//! Per-tick affix behaviors
//!
//! All timers are polled: a behavior fires on the first tick that observes
//! `now` past its deadline, so resolution is bounded by the tick rate.
//!
//! | Affix       | Behavior                                                    |
//! |-------------|-------------------------------------------------------------|
//! | Shielded    | Shield marker every `shield_interval_secs` while in combat  |
//! | Berserker   | Power scales with missing health                            |
//! | Phasing     | 2s of stealth every 8s                                      |
//! | Illusionist | Every 20s, two 50% rolls for a short-lived decoy            |
//!
//! Elites older than `max_lifetime_secs` are destroyed after the pass,
//! without restoring their stats.


use elitemobs_types::{Affix, EliteConfig, Tier};
use tracing::{debug, info, warn};

use crate::engine::{EliteEngine, apply_tier_identity, try_apply_marker, try_remove_marker};
use crate::host::{
    ActorHandle, Health, Host, HostError, Marker, Position, RandomSource, UnitKind, UnitLevel,
    UnitStats,
};
use crate::registry::{AffixTimers, BaselineStats};
use crate::spawn::SpawnCorrelator;

pub const PHASE_DURATION_SECS: f64 = 2.0;
pub const PHASE_INTERVAL_SECS: f64 = 8.0;

pub const DECOY_INTERVAL_SECS: f64 = 20.0;
pub const DECOY_LIFETIME_SECS: f32 = 10.0;
pub const DECOY_TRIALS: usize = 2;
/// A trial spawns a decoy when its roll is at or below this
pub const DECOY_CHANCE: f64 = 0.5;
pub const DECOY_LEVEL_OFFSET: u32 = 10;

/// Floating weapon units an Illusionist can conjure
pub const DECOY_UNITS: [UnitKind; 6] = [
    UnitKind(1_971_653_132),  // axe
    UnitKind(-1_099_451_233), // base
    UnitKind(-55_245_645),    // mace
    UnitKind(769_910_415),    // slashers
    UnitKind(233_127_264),    // spear
    UnitKind(-2_020_619_708), // sword
];

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub timed_out: usize,
    pub shields_applied: usize,
    pub phases_started: usize,
    pub decoys_requested: usize,
    pub expired_spawns: usize,
}

/// Borrowed engine state an affix behavior may touch
struct TickContext<'a, H> {
    host: &'a mut H,
    rng: &'a mut dyn RandomSource,
    spawns: &'a mut SpawnCorrelator<H>,
    config: &'a EliteConfig,
    report: &'a mut TickReport,
    now: f64,
}

impl<H: Host> TickContext<'_, H> {
    fn shielded(&mut self, actor: ActorHandle, timers: &mut AffixTimers) {
        if !self.config.toggles.enable_shielded
            || !self.host.has_marker(actor, Marker::InCombat)
            || self.now < timers.next_shield_time
        {
            return;
        }
        try_apply_marker(self.host, actor, Marker::Shield);
        timers.next_shield_time = self.now + self.config.shield_interval_secs;
        self.report.shields_applied += 1;
        debug!(%actor, "Shield applied");
    }

    fn berserker(
        &mut self,
        actor: ActorHandle,
        tier: Tier,
        baseline: &BaselineStats,
        timers: &mut AffixTimers,
    ) -> Result<(), HostError> {
        let Some(health) = self.host.read::<Health>(actor) else {
            return Ok(());
        };
        if health.max <= 0.0 {
            return Ok(());
        }

        let fraction = health.fraction();
        let rage = 1.0 + (1.0 - fraction);
        let tier_dmg = 1.0 + self.config.tier(tier).dmg_multiplier;

        if let Some(mut stats) = self.host.read::<UnitStats>(actor) {
            if baseline.physical_power > 0.0 {
                stats.physical_power = baseline.physical_power * tier_dmg * rage;
            }
            if baseline.spell_power > 0.0 {
                stats.spell_power = baseline.spell_power * tier_dmg * rage;
            }
            self.host.write(actor, stats)?;
        }

        timers.last_hp_fraction = fraction;
        Ok(())
    }

    fn phasing(&mut self, actor: ActorHandle, tier: Tier, timers: &mut AffixTimers) {
        if !self.config.toggles.enable_phasing {
            return;
        }

        if let Some(end) = timers.phase_end_time
            && self.now >= end
        {
            try_remove_marker(self.host, actor, Marker::Stealth);
            apply_tier_identity(self.host, self.config, actor, tier);
            timers.phase_end_time = None;
        }

        if self.now >= timers.next_phase_time {
            try_apply_marker(self.host, actor, Marker::Stealth);
            timers.phase_end_time = Some(self.now + PHASE_DURATION_SECS);
            timers.next_phase_time = self.now + PHASE_INTERVAL_SECS;
            self.report.phases_started += 1;
        }
    }

    fn illusionist(&mut self, actor: ActorHandle, timers: &mut AffixTimers) {
        if self.now < timers.next_decoy_time {
            return;
        }
        timers.next_decoy_time = self.now + DECOY_INTERVAL_SECS;

        let (Some(Position(position)), Some(UnitLevel(level))) = (
            self.host.read::<Position>(actor),
            self.host.read::<UnitLevel>(actor),
        ) else {
            return;
        };
        let decoy_level = level.saturating_sub(DECOY_LEVEL_OFFSET).max(1);

        let mut requested = 0;
        for _ in 0..DECOY_TRIALS {
            if self.rng.uniform01() > DECOY_CHANCE {
                continue;
            }
            let pick = self.rng.uniform_int(DECOY_UNITS.len());
            let unit = DECOY_UNITS[pick.min(DECOY_UNITS.len() - 1)];
            let result = self.spawns.spawn_with_callback(
                self.host,
                self.rng,
                self.now,
                unit,
                position,
                Some(DECOY_LIFETIME_SECS),
                Box::new(move |decoy, host: &mut H| {
                    if host.has::<UnitLevel>(decoy) {
                        host.write(decoy, UnitLevel(decoy_level))
                    } else {
                        Ok(())
                    }
                }),
            );
            match result {
                Ok(_) => requested += 1,
                Err(err) => warn!(%actor, error = %err, "Decoy spawn failed"),
            }
        }

        if requested > 0 {
            self.report.decoys_requested += requested;
            info!(%actor, requested, level = decoy_level, "Illusionist conjured decoys");
        }
    }
}

impl<H: Host> EliteEngine<H> {
    /// Run one scheduler pass at clock time `now`.
    pub fn tick(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        let max_lifetime = self.config.max_lifetime_secs;
        let mut timed_out = Vec::new();

        let Self {
            host,
            rng,
            config,
            registry,
            spawns,
            ..
        } = self;
        let mut ctx = TickContext {
            host: &mut *host,
            rng: rng.as_mut(),
            spawns: &mut *spawns,
            config: &*config,
            report: &mut report,
            now,
        };

        for (actor, record) in registry.iter_mut() {
            if !ctx.host.exists(actor) {
                continue;
            }
            if max_lifetime > 0.0 && record.age(now) > max_lifetime {
                timed_out.push(actor);
                continue;
            }

            let tier = record.tier;
            let baseline = record.baseline;
            let timers = &mut record.timers;
            for affix in &record.affixes {
                match affix {
                    Affix::Shielded => ctx.shielded(actor, timers),
                    Affix::Berserker => {
                        if let Err(err) = ctx.berserker(actor, tier, &baseline, timers) {
                            warn!(%actor, error = %err, "Berserker update failed");
                        }
                    }
                    Affix::Phasing => ctx.phasing(actor, tier, timers),
                    Affix::Illusionist => ctx.illusionist(actor, timers),
                    _ => {}
                }
            }
        }

        for actor in timed_out {
            registry.remove(actor);
            if !host.exists(actor) {
                continue;
            }
            match host.destroy(actor) {
                Ok(()) => {
                    report.timed_out += 1;
                    info!(%actor, remaining = registry.len(), "Timed out elite destroyed");
                }
                Err(err) => warn!(%actor, error = %err, "Could not destroy timed out elite"),
            }
        }

        report.expired_spawns = spawns.sweep_expired(now);
        report
    }
}
