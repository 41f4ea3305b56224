//! Tests for promotion and demotion
//!
//! Covers stat capture and restore, the staged commit rollback, markers and
//! registry bookkeeping.

use elitemobs_types::{Affix, EliteConfig, Tier};
use glam::Vec3;

use crate::host::{
    ActorHandle, AttackSpeed, Capability, EntityStore, Health, Marker, MarkerService, UnitStats,
};
use crate::testing::Fixture;

fn health(fx: &Fixture, actor: ActorHandle) -> Health {
    fx.engine.host().read::<Health>(actor).unwrap()
}

fn stats(fx: &Fixture, actor: ActorHandle) -> UnitStats {
    fx.engine.host().read::<UnitStats>(actor).unwrap()
}

fn speed(fx: &Fixture, actor: ActorHandle) -> AttackSpeed {
    fx.engine.host().read::<AttackSpeed>(actor).unwrap()
}

#[test]
fn test_champion_scenario_scales_then_restores() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    assert!(fx.engine.promote(mob, Tier::Champion, None));
    assert_eq!(health(&fx, mob), Health::full(150.0));
    assert_eq!(stats(&fx, mob).physical_power, 25.0);
    assert_eq!(stats(&fx, mob).spell_power, 12.5);

    let record = fx.engine.record(mob).unwrap();
    assert_eq!(record.tier, Tier::Champion);
    assert!(record.affixes.is_empty());
    assert_eq!(record.baseline.max_health, 100.0);
    assert_eq!(record.spawn_time, fx.now());

    assert!(fx.engine.demote(mob));
    assert_eq!(health(&fx, mob), Health::full(100.0));
    assert_eq!(stats(&fx, mob).physical_power, 20.0);
    assert_eq!(stats(&fx, mob).spell_power, 10.0);
    assert!(!fx.engine.is_elite(mob));
}

#[test]
fn test_demote_keeps_damage_taken() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.engine.promote(mob, Tier::Champion, None);

    fx.world().insert(
        mob,
        Health {
            current: 40.0,
            max: 150.0,
        },
    );
    fx.engine.demote(mob);
    assert_eq!(
        health(&fx, mob),
        Health {
            current: 40.0,
            max: 100.0
        }
    );
}

#[test]
fn test_demote_untracked_is_noop() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    assert!(!fx.engine.demote(mob));
    assert_eq!(health(&fx, mob), Health::full(100.0));
}

#[test]
fn test_apex_affix_setup_round_trips() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    assert!(fx.engine.promote(
        mob,
        Tier::Apex,
        Some(vec![Affix::Frenzied, Affix::Ironhide])
    ));
    assert_eq!(health(&fx, mob).max, 400.0);
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 2.0, primary: 2.0 });
    assert_eq!(stats(&fx, mob).damage_reduction, 0.55);

    fx.engine.demote(mob);
    assert_eq!(health(&fx, mob).max, 100.0);
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 1.0, primary: 1.0 });
    assert_eq!(stats(&fx, mob).damage_reduction, 0.0);
}

#[test]
fn test_duplicate_frenzied_compounds_and_reverts() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    fx.engine
        .promote(mob, Tier::Apex, Some(vec![Affix::Frenzied, Affix::Frenzied]));
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 4.0, primary: 4.0 });

    fx.engine.demote(mob);
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 1.0, primary: 1.0 });
}

#[test]
fn test_failed_health_restore_still_restores_other_stats() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    assert!(fx.engine.promote(mob, Tier::Apex, Some(vec![Affix::Frenzied])));
    fx.world().fail_writes::<Health>(mob);

    assert!(fx.engine.demote(mob));
    assert_eq!(health(&fx, mob).max, 400.0);
    assert_eq!(stats(&fx, mob).physical_power, 20.0);
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 1.0, primary: 1.0 });
    assert!(!fx.engine.host().has_marker(mob, Marker::ApexAura));
    assert!(!fx.engine.is_elite(mob));
}

#[test]
fn test_damage_reduction_reset_versus_restore() {
    let with_base_reduction = |fx: &mut Fixture| {
        let mob = fx.mob(100.0);
        let mut base = stats(fx, mob);
        base.damage_reduction = 0.25;
        fx.world().insert(mob, base);
        mob
    };

    let mut fx = Fixture::new();
    let mob = with_base_reduction(&mut fx);
    fx.engine.promote(mob, Tier::Warlord, Some(vec![Affix::Ironhide]));
    assert_eq!(stats(&fx, mob).damage_reduction, 0.25 + 0.55);
    fx.engine.demote(mob);
    assert_eq!(stats(&fx, mob).damage_reduction, 0.0);

    let mut cfg = EliteConfig::default();
    cfg.restore_damage_reduction = true;
    let mut fx = Fixture::with_config(cfg);
    let mob = with_base_reduction(&mut fx);
    fx.engine.promote(mob, Tier::Warlord, Some(vec![Affix::Ironhide]));
    fx.engine.demote(mob);
    assert_eq!(stats(&fx, mob).damage_reduction, 0.25);
}

#[test]
fn test_failed_commit_rolls_back_every_write() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.world().fail_writes::<AttackSpeed>(mob);

    assert!(!fx.engine.promote(mob, Tier::Warlord, Some(vec![Affix::Frenzied])));

    assert!(!fx.engine.is_elite(mob));
    assert_eq!(health(&fx, mob), Health::full(100.0));
    assert_eq!(stats(&fx, mob).physical_power, 20.0);
    assert_eq!(speed(&fx, mob), AttackSpeed { ability: 1.0, primary: 1.0 });
    assert!(!fx.engine.host().has_marker(mob, Marker::WarlordAura));
}

#[test]
fn test_failed_commit_keeps_previous_record() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.engine.promote(mob, Tier::Champion, None);
    fx.world().fail_writes::<UnitStats>(mob);

    assert!(!fx.engine.promote(mob, Tier::Apex, Some(Vec::new())));
    assert_eq!(fx.engine.record(mob).map(|r| r.tier), Some(Tier::Champion));
    assert_eq!(health(&fx, mob), Health::full(150.0));
}

#[test]
fn test_promote_missing_actor_fails() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.world().destroy(mob).unwrap();

    assert!(!fx.engine.promote(mob, Tier::Champion, None));
    assert_eq!(fx.engine.active_count(), 0);
}

#[test]
fn test_forced_repromotion_compounds_stats() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    fx.engine.promote(mob, Tier::Champion, None);
    fx.engine.promote(mob, Tier::Champion, None);
    assert_eq!(health(&fx, mob).max, 225.0);
    assert_eq!(fx.engine.record(mob).unwrap().baseline.max_health, 150.0);
    assert_eq!(fx.engine.active_count(), 1);

    // Demoting only undoes the most recent promotion
    fx.engine.demote(mob);
    assert_eq!(health(&fx, mob).max, 150.0);
}

#[test]
fn test_promotion_applies_markers_and_persistence_exclusion() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    fx.engine.promote(mob, Tier::Warlord, Some(vec![Affix::Bolstering]));
    let host = fx.engine.host();
    assert!(host.has_marker(mob, Marker::WarlordAura));
    assert!(host.has_marker(mob, Marker::Bolstering));
    assert!(host.has_capability(mob, Capability::ExcludeFromPersistence));

    fx.world().apply_marker(mob, Marker::Stealth).unwrap();
    fx.engine.demote(mob);
    let host = fx.engine.host();
    for marker in Marker::ELITE_MARKERS {
        assert!(!host.has_marker(mob, marker), "{marker:?} left behind");
    }
}

#[test]
fn test_disabled_toggles_skip_markers() {
    let mut cfg = EliteConfig::default();
    cfg.toggles.apply_tier_aura = false;
    cfg.toggles.apply_bolstering = false;
    cfg.toggles.exclude_from_persistence = false;
    let mut fx = Fixture::with_config(cfg);
    let mob = fx.mob(100.0);

    fx.engine.promote(mob, Tier::Apex, Some(vec![Affix::Bolstering]));
    let host = fx.engine.host();
    assert!(!host.has_marker(mob, Marker::ApexAura));
    assert!(!host.has_marker(mob, Marker::Bolstering));
    assert!(!host.has_capability(mob, Capability::ExcludeFromPersistence));
}

#[test]
fn test_marker_failure_does_not_fail_promotion() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.world().reject_markers(true);

    assert!(fx.engine.promote(mob, Tier::Apex, Some(vec![Affix::Bolstering])));
    assert!(fx.engine.is_elite(mob));
    assert!(!fx.engine.host().has_marker(mob, Marker::ApexAura));
}

#[test]
fn test_illusionist_schedules_first_decoy() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    let now = fx.now();

    fx.engine
        .promote(mob, Tier::Warlord, Some(vec![Affix::Illusionist]));
    assert_eq!(
        fx.engine.record(mob).unwrap().timers.next_decoy_time,
        now + 20.0
    );
}

#[test]
fn test_rolled_affixes_follow_tier_count() {
    let mut fx = Fixture::new();
    let warlord = fx.mob(100.0);
    let apex = fx.mob(100.0);
    fx.rng.push_ints([2, 0, 1]);

    fx.engine.promote(warlord, Tier::Warlord, None);
    fx.engine.promote(apex, Tier::Apex, None);

    assert_eq!(fx.engine.record(warlord).unwrap().affixes, vec![Affix::Frenzied]);
    assert_eq!(
        fx.engine.record(apex).unwrap().affixes,
        vec![Affix::Vampiric, Affix::Thorns]
    );
}

#[test]
fn test_try_promote_filters_candidates() {
    let mut cfg = EliteConfig::default();
    cfg.champion.spawn_chance = 1.0;
    let mut fx = Fixture::with_config(cfg);

    let player = fx.world().spawn_player(Vec3::ZERO, 500.0);
    let vendor = fx.mob(100.0);
    fx.world().grant(vendor, Capability::Vendor);
    let boss = fx.mob(100.0);
    fx.world().grant(boss, Capability::NamedBoss);
    let minion = fx.mob(100.0);
    fx.world().grant(minion, Capability::Minion);
    let prop = fx.world().spawn_empty();

    for actor in [player, vendor, boss, minion, prop] {
        assert!(!fx.engine.try_promote(actor), "{actor} promoted");
    }

    let mob = fx.mob(100.0);
    assert!(fx.engine.try_promote(mob));
    assert_eq!(fx.engine.record(mob).unwrap().tier, Tier::Champion);
    // Already tracked
    assert!(!fx.engine.try_promote(mob));
}

#[test]
fn test_try_promote_respects_roll_and_enabled() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);

    // Default chances: 0.999 is no tier
    assert!(!fx.engine.try_promote(mob));

    fx.rng.push_floats([0.001]);
    let mut cfg = fx.engine.config().clone();
    cfg.enabled = false;
    fx.engine.set_config(cfg.clone());
    assert!(!fx.engine.try_promote(mob));

    cfg.enabled = true;
    fx.engine.set_config(cfg);
    fx.rng.push_ints([0, 0]);
    assert!(fx.engine.try_promote(mob));
    assert_eq!(fx.engine.record(mob).unwrap().tier, Tier::Apex);
}

#[test]
fn test_demote_stale_handle_drops_record() {
    let mut fx = Fixture::new();
    let mob = fx.mob(100.0);
    fx.engine.promote(mob, Tier::Champion, None);
    fx.world().destroy(mob).unwrap();

    assert!(fx.engine.demote(mob));
    assert!(!fx.engine.is_elite(mob));
}

#[test]
fn test_purge_all_demotes_live_and_drops_stale() {
    let mut fx = Fixture::new();
    let mobs: Vec<_> = (0..4).map(|_| fx.mob(100.0)).collect();
    for mob in &mobs {
        fx.engine.promote(*mob, Tier::Champion, None);
    }
    fx.world().destroy(mobs[3]).unwrap();

    assert_eq!(fx.engine.purge_all(), 3);
    assert_eq!(fx.engine.active_count(), 0);
    assert_eq!(health(&fx, mobs[0]).max, 100.0);

    assert_eq!(fx.engine.purge_all(), 0);
}

#[test]
fn test_cleanup_stale_leaves_live_records() {
    let mut fx = Fixture::new();
    let live = fx.mob(100.0);
    let gone = fx.mob(100.0);
    fx.engine.promote(live, Tier::Champion, None);
    fx.engine.promote(gone, Tier::Champion, None);
    fx.world().destroy(gone).unwrap();

    assert_eq!(fx.engine.cleanup_stale(), 1);
    assert!(fx.engine.is_elite(live));
    assert_eq!(health(&fx, live).max, 150.0);
}

#[test]
fn test_death_drops_record_without_restoring() {
    let mut fx = Fixture::new();
    let elite = fx.mob(100.0);
    let plain = fx.mob(100.0);
    fx.engine.promote(elite, Tier::Warlord, Some(vec![Affix::Thorns]));

    assert_eq!(fx.engine.xp_multiplier(elite), 2.0);
    assert_eq!(fx.engine.on_deaths(&[elite, plain]), 1);
    assert!(!fx.engine.is_elite(elite));
    assert_eq!(health(&fx, elite).max, 250.0);
    assert!(fx.engine.on_death(elite).is_none());
}

#[test]
fn test_list_near_sorted_by_distance() {
    let mut fx = Fixture::new();
    let far = fx.mob_at(100.0, Vec3::new(30.0, 0.0, 0.0));
    let near = fx.mob_at(100.0, Vec3::new(5.0, 0.0, 0.0));
    let outside = fx.mob_at(100.0, Vec3::new(80.0, 0.0, 0.0));
    let _plain = fx.mob_at(100.0, Vec3::new(1.0, 0.0, 0.0));
    for mob in [far, near, outside] {
        fx.engine.promote(mob, Tier::Champion, None);
    }

    let found: Vec<_> = fx
        .engine
        .list_near(Vec3::ZERO, 50.0)
        .into_iter()
        .map(|e| (e.actor, e.distance))
        .collect();
    assert_eq!(found, vec![(near, 5.0), (far, 30.0)]);
}
