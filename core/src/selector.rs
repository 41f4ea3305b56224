//! Tier and affix selection
//!
//! Tier thresholds are cumulative in rarity-first order (Apex, Warlord,
//! Champion). If the configured chances sum past 1.0 the overflow comes out of
//! the "no tier" outcome; nothing is normalized.

use elitemobs_types::{Affix, AffixSampling, EliteConfig, Tier};

use crate::host::RandomSource;

pub struct TierSelector<'a> {
    config: &'a EliteConfig,
}

impl<'a> TierSelector<'a> {
    pub fn new(config: &'a EliteConfig) -> Self {
        Self { config }
    }

    /// Map a uniform draw in [0, 1) to a tier
    pub fn tier_for_roll(&self, roll: f64) -> Option<Tier> {
        let mut threshold = 0.0;
        for tier in [Tier::Apex, Tier::Warlord, Tier::Champion] {
            threshold += self.config.tier(tier).spawn_chance;
            if roll < threshold {
                return Some(tier);
            }
        }
        None
    }

    pub fn roll_tier(&self, rng: &mut dyn RandomSource) -> Option<Tier> {
        self.tier_for_roll(rng.uniform01())
    }

    /// Affixes a `tier` may roll under the current feature toggles
    pub fn eligible_pool(&self, tier: Tier) -> Vec<Affix> {
        let toggles = &self.config.toggles;
        Affix::ALL
            .into_iter()
            .filter(|a| *a != Affix::Shielded || toggles.enable_shielded)
            .filter(|a| *a != Affix::Phasing || toggles.enable_phasing)
            .filter(|a| *a != Affix::Bolstering || toggles.apply_bolstering)
            .filter(|a| !(tier == Tier::Apex && *a == Affix::Berserker))
            .collect()
    }

    /// Draw up to `count` affixes. Stops early once the pool is empty.
    pub fn roll_affixes(&self, tier: Tier, count: usize, rng: &mut dyn RandomSource) -> Vec<Affix> {
        let mut pool = self.eligible_pool(tier);
        let mut rolled = Vec::with_capacity(count);

        for _ in 0..count {
            if pool.is_empty() {
                break;
            }
            let idx = rng.uniform_int(pool.len()).min(pool.len() - 1);
            match self.config.affix_sampling {
                AffixSampling::WithReplacement => rolled.push(pool[idx]),
                AffixSampling::WithoutReplacement => rolled.push(pool.remove(idx)),
            }
        }

        rolled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRandom;

    fn scenario_config() -> EliteConfig {
        let mut cfg = EliteConfig::default();
        cfg.apex.spawn_chance = 0.003;
        cfg.warlord.spawn_chance = 0.02;
        cfg.champion.spawn_chance = 0.07;
        cfg
    }

    #[test]
    fn test_scenario_rolls_map_to_expected_tiers() {
        let cfg = scenario_config();
        let selector = TierSelector::new(&cfg);

        assert_eq!(selector.tier_for_roll(0.001), Some(Tier::Apex));
        assert_eq!(selector.tier_for_roll(0.01), Some(Tier::Warlord));
        assert_eq!(selector.tier_for_roll(0.05), Some(Tier::Champion));
        assert_eq!(selector.tier_for_roll(0.5), None);
    }

    #[test]
    fn test_thresholds_partition_unit_interval() {
        let cfg = scenario_config();
        let selector = TierSelector::new(&cfg);

        // Boundaries belong to the next (more common) band
        assert_eq!(selector.tier_for_roll(0.0), Some(Tier::Apex));
        assert_eq!(selector.tier_for_roll(0.003), Some(Tier::Warlord));

        // Sweeping [0, 1) visits each band once, in rarity order
        let rank = |t: Option<Tier>| match t {
            Some(Tier::Apex) => 0,
            Some(Tier::Warlord) => 1,
            Some(Tier::Champion) => 2,
            None => 3,
        };
        let mut last = 0;
        let mut seen = [false; 4];
        for i in 0..10_000 {
            let r = rank(selector.tier_for_roll(i as f64 / 10_000.0));
            assert!(r >= last, "bands must not interleave");
            last = r;
            seen[r] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_oversubscribed_chances_shrink_none_outcome() {
        let mut cfg = EliteConfig::default();
        cfg.apex.spawn_chance = 0.5;
        cfg.warlord.spawn_chance = 0.4;
        cfg.champion.spawn_chance = 0.4;
        let selector = TierSelector::new(&cfg);

        assert_eq!(selector.tier_for_roll(0.95), Some(Tier::Champion));
        assert_eq!(selector.tier_for_roll(0.999_999), Some(Tier::Champion));
    }

    #[test]
    fn test_warlord_always_gets_one_affix() {
        let cfg = EliteConfig::default();
        let selector = TierSelector::new(&cfg);
        let mut rng = crate::host::SeededRandom::from_seed(11);

        for _ in 0..200 {
            assert_eq!(selector.roll_affixes(Tier::Warlord, 1, &mut rng).len(), 1);
        }
    }

    #[test]
    fn test_apex_never_rolls_berserker() {
        let cfg = EliteConfig::default();
        let selector = TierSelector::new(&cfg);
        assert!(!selector.eligible_pool(Tier::Apex).contains(&Affix::Berserker));
        assert!(selector.eligible_pool(Tier::Warlord).contains(&Affix::Berserker));

        let mut rng = crate::host::SeededRandom::from_seed(3);
        for _ in 0..500 {
            let affixes = selector.roll_affixes(Tier::Apex, 2, &mut rng);
            assert_eq!(affixes.len(), 2);
            assert!(!affixes.contains(&Affix::Berserker));
        }
    }

    #[test]
    fn test_disabled_toggles_shrink_pool() {
        let mut cfg = EliteConfig::default();
        cfg.toggles.enable_shielded = false;
        cfg.toggles.enable_phasing = false;
        cfg.toggles.apply_bolstering = false;
        let selector = TierSelector::new(&cfg);

        let pool = selector.eligible_pool(Tier::Warlord);
        assert_eq!(pool.len(), 8);
        assert!(!pool.contains(&Affix::Shielded));
        assert!(!pool.contains(&Affix::Phasing));
        assert!(!pool.contains(&Affix::Bolstering));
    }

    #[test]
    fn test_with_replacement_can_repeat() {
        let cfg = EliteConfig::default();
        let selector = TierSelector::new(&cfg);
        let mut rng = ScriptedRandom::new().ints([0, 0]);

        assert_eq!(
            selector.roll_affixes(Tier::Apex, 2, &mut rng),
            vec![Affix::Vampiric, Affix::Vampiric]
        );
    }

    #[test]
    fn test_without_replacement_never_repeats() {
        let mut cfg = EliteConfig::default();
        cfg.affix_sampling = AffixSampling::WithoutReplacement;
        let selector = TierSelector::new(&cfg);
        let mut rng = ScriptedRandom::new().ints([0, 0]);

        assert_eq!(
            selector.roll_affixes(Tier::Apex, 2, &mut rng),
            vec![Affix::Vampiric, Affix::Thorns]
        );

        // Asking for more than the pool holds stops once it is drained
        let mut rng = crate::host::SeededRandom::from_seed(5);
        let all = selector.roll_affixes(Tier::Warlord, 50, &mut rng);
        assert_eq!(all.len(), 11);
    }

    #[test]
    fn test_zero_count_rolls_nothing() {
        let cfg = EliteConfig::default();
        let selector = TierSelector::new(&cfg);
        let mut rng = ScriptedRandom::new();
        assert!(selector.roll_affixes(Tier::Champion, 0, &mut rng).is_empty());
    }
}
