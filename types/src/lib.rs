//! Shared configuration types for elitemobs
//!
//! This crate contains the serializable tier/affix vocabulary and the
//! configuration shape shared between the engine (elitemobs-core) and the
//! admin front-end (elitemobs-cli).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Tiers & Affixes
// ─────────────────────────────────────────────────────────────────────────────

/// Elite rank. Determines stat multipliers, XP multiplier and affix count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Common elite: +50% HP, +25% DMG, 2x XP, no affixes
    Champion,
    /// Rare elite: +150% HP, +50% DMG, 2x XP, 1 affix
    Warlord,
    /// Ultra rare: +300% HP, +100% DMG, 4x XP, 2 affixes
    Apex,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Champion, Tier::Warlord, Tier::Apex];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Champion => "Champion",
            Tier::Warlord => "Warlord",
            Tier::Apex => "Apex",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.label())
    }
}

impl FromStr for Tier {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "champion" => Ok(Tier::Champion),
            "warlord" => Ok(Tier::Warlord),
            "apex" => Ok(Tier::Apex),
            _ => Err(ParseNameError::UnknownTier {
                name: s.to_string(),
            }),
        }
    }
}

/// Independent special behavior attached to an elite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affix {
    /// Heals 2% of max HP per hit dealt
    Vampiric,
    /// Reflects 3% of the elite's max HP back to a player attacker
    Thorns,
    /// 2x attack speed
    Frenzied,
    /// Flat damage reduction bonus
    Ironhide,
    /// Every 8s, goes invisible for 2s
    Phasing,
    /// Spawns 2 copies of itself the first time it takes damage
    Summoner,
    /// +1% damage per 1% HP lost (never rolled for Apex)
    Berserker,
    /// 35% chance to freeze on hit
    Chilling,
    /// Periodic damage immunity while in combat
    Shielded,
    /// Spawns floating weapon decoys every 20s
    Illusionist,
    /// Level aura that buffs nearby mobs
    Bolstering,
}

impl Affix {
    /// Declaration order. Affix rolls index into this order, so it is stable.
    pub const ALL: [Affix; 11] = [
        Affix::Vampiric,
        Affix::Thorns,
        Affix::Frenzied,
        Affix::Ironhide,
        Affix::Phasing,
        Affix::Summoner,
        Affix::Berserker,
        Affix::Chilling,
        Affix::Shielded,
        Affix::Illusionist,
        Affix::Bolstering,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Affix::Vampiric => "Vampiric",
            Affix::Thorns => "Thorns",
            Affix::Frenzied => "Frenzied",
            Affix::Ironhide => "Ironhide",
            Affix::Phasing => "Phasing",
            Affix::Summoner => "Summoner",
            Affix::Berserker => "Berserker",
            Affix::Chilling => "Chilling",
            Affix::Shielded => "Shielded",
            Affix::Illusionist => "Illusionist",
            Affix::Bolstering => "Bolstering",
        }
    }

    /// Parse a comma separated list (`"vampiric, thorns"`).
    /// `"none"` and the empty string yield an empty list.
    pub fn parse_list(input: &str) -> Result<Vec<Affix>, ParseNameError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Vec::new());
        }
        trimmed.split(',').map(|part| part.parse()).collect()
    }
}

impl fmt::Display for Affix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Affix {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Affix::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseNameError::UnknownAffix {
                name: wanted.to_string(),
            })
    }
}

/// Rejected tier or affix name from an admin command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseNameError {
    #[error("unknown tier '{name}' (use champion, warlord, apex)")]
    UnknownTier { name: String },

    #[error("unknown affix '{name}'")]
    UnknownAffix { name: String },
}

/// How affix sets are drawn from the eligible pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixSampling {
    /// Every draw uses the full pool; an Apex may roll the same affix twice.
    #[default]
    WithReplacement,
    /// Drawn affixes leave the pool, so a set never repeats an affix.
    WithoutReplacement,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Per-tier spawn and scaling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSettings {
    /// Probability per scanned mob (0.07 = 7%)
    pub spawn_chance: f64,
    /// Max health bonus (0.50 = +50%)
    pub hp_multiplier: f32,
    /// Physical/spell power bonus (0.25 = +25%)
    pub dmg_multiplier: f32,
    pub xp_multiplier: f32,
    pub affix_count: usize,
}

impl TierSettings {
    pub fn champion() -> Self {
        Self {
            spawn_chance: 0.07,
            hp_multiplier: 0.50,
            dmg_multiplier: 0.25,
            xp_multiplier: 2.0,
            affix_count: 0,
        }
    }

    pub fn warlord() -> Self {
        Self {
            spawn_chance: 0.02,
            hp_multiplier: 1.50,
            dmg_multiplier: 0.50,
            xp_multiplier: 2.0,
            affix_count: 1,
        }
    }

    pub fn apex() -> Self {
        Self {
            spawn_chance: 0.003,
            hp_multiplier: 3.0,
            dmg_multiplier: 1.0,
            xp_multiplier: 4.0,
            affix_count: 2,
        }
    }
}

/// Switches for behaviors that touch the host beyond plain stat writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Mark promoted mobs so the host never persists them
    #[serde(default = "default_true")]
    pub exclude_from_persistence: bool,
    /// Apply the tier identity marker on promotion and after phasing
    #[serde(default = "default_true")]
    pub apply_tier_aura: bool,
    /// Apply the Bolstering marker and allow the affix to be rolled
    #[serde(default = "default_true")]
    pub apply_bolstering: bool,
    #[serde(default = "default_true")]
    pub enable_shielded: bool,
    #[serde(default = "default_true")]
    pub enable_phasing: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            exclude_from_persistence: true,
            apply_tier_aura: true,
            apply_bolstering: true,
            enable_shielded: true,
            enable_phasing: true,
        }
    }
}

/// Top-level engine configuration (persisted as TOML).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    // ─── Tiers ──────────────────────────────────────────────────────────────
    #[serde(default = "TierSettings::champion")]
    pub champion: TierSettings,
    #[serde(default = "TierSettings::warlord")]
    pub warlord: TierSettings,
    #[serde(default = "TierSettings::apex")]
    pub apex: TierSettings,
    #[serde(default)]
    pub affix_sampling: AffixSampling,

    // ─── Affix timing ───────────────────────────────────────────────────────
    /// Seconds between Shielded re-applications
    #[serde(default = "default_shield_interval")]
    pub shield_interval_secs: f64,
    /// Max seconds an elite lives before forced removal (0 = unlimited)
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: f64,

    // ─── Demotion ───────────────────────────────────────────────────────────
    /// Restore the captured damage reduction on demote instead of zeroing it
    #[serde(default)]
    pub restore_damage_reduction: bool,

    // ─── Deferred spawns ────────────────────────────────────────────────────
    /// Pending post-spawn callbacks older than this are dropped
    #[serde(default = "default_pending_ttl")]
    pub pending_spawn_ttl_secs: f64,
    /// Size of the random correlation key space
    #[serde(default = "default_key_space")]
    pub spawn_key_space: u64,

    // ─── Scanner ────────────────────────────────────────────────────────────
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: f64,
    /// Run registry hygiene every N scans
    #[serde(default = "default_purge_every")]
    pub purge_every_scans: u32,

    #[serde(default)]
    pub toggles: FeatureToggles,
}

impl Default for EliteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            champion: TierSettings::champion(),
            warlord: TierSettings::warlord(),
            apex: TierSettings::apex(),
            affix_sampling: AffixSampling::default(),
            shield_interval_secs: default_shield_interval(),
            max_lifetime_secs: default_max_lifetime(),
            restore_damage_reduction: false,
            pending_spawn_ttl_secs: default_pending_ttl(),
            spawn_key_space: default_key_space(),
            scan_interval_secs: default_scan_interval(),
            purge_every_scans: default_purge_every(),
            toggles: FeatureToggles::default(),
        }
    }
}

impl EliteConfig {
    pub fn tier(&self, tier: Tier) -> &TierSettings {
        match tier {
            Tier::Champion => &self.champion,
            Tier::Warlord => &self.warlord,
            Tier::Apex => &self.apex,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_shield_interval() -> f64 {
    15.0
}

fn default_max_lifetime() -> f64 {
    300.0
}

fn default_pending_ttl() -> f64 {
    30.0
}

fn default_key_space() -> u64 {
    10_000
}

fn default_scan_interval() -> f64 {
    5.0
}

fn default_purge_every() -> u32 {
    60
}
