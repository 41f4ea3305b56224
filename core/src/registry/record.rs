//! Elite record (runtime state of one promoted actor)
//!
//! A record is created by promotion, mutated by the affix scheduler and the
//! combat hooks, and dropped by demotion, death, timeout or stale cleanup.

use elitemobs_types::{Affix, Tier};

use crate::host::UnitKind;

/// Actor stats captured immediately before promotion mutated anything.
/// Zero means the actor had no such stat.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaselineStats {
    pub max_health: f32,
    pub physical_power: f32,
    pub spell_power: f32,
    pub damage_reduction: f32,
    pub unit_kind: Option<UnitKind>,
}

/// Mutable per-affix timer state (absolute clock seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffixTimers {
    pub next_shield_time: f64,
    pub next_phase_time: f64,
    /// Set while a phasing window is open
    pub phase_end_time: Option<f64>,
    pub next_decoy_time: f64,
    /// One-shot latch for Summoner
    pub summoner_triggered: bool,
    /// Last health fraction observed by Berserker
    pub last_hp_fraction: f32,
}

impl Default for AffixTimers {
    fn default() -> Self {
        Self {
            next_shield_time: 0.0,
            next_phase_time: 0.0,
            phase_end_time: None,
            next_decoy_time: 0.0,
            summoner_triggered: false,
            last_hp_fraction: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EliteRecord {
    pub tier: Tier,

    /// Ordered; may contain duplicates when rolled with replacement
    pub affixes: Vec<Affix>,

    pub baseline: BaselineStats,

    pub timers: AffixTimers,

    /// Clock time of the promotion that created this record
    pub spawn_time: f64,
}

impl EliteRecord {
    pub fn new(tier: Tier, affixes: Vec<Affix>, baseline: BaselineStats, spawn_time: f64) -> Self {
        Self {
            tier,
            affixes,
            baseline,
            timers: AffixTimers::default(),
            spawn_time,
        }
    }

    pub fn has_affix(&self, affix: Affix) -> bool {
        self.affixes.contains(&affix)
    }

    /// Number of times `affix` appears in the set
    pub fn affix_count(&self, affix: Affix) -> usize {
        self.affixes.iter().filter(|a| **a == affix).count()
    }

    /// "Vampiric, Thorns", or "" with no affixes
    pub fn affix_summary(&self) -> String {
        self.affixes
            .iter()
            .map(Affix::name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Seconds since promotion
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawn_time
    }
}
