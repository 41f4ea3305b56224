use std::io::Write;

use elitemobs_core::host::{EntityStore, Health, MarkerService, MobTemplate, UnitKind};
use elitemobs_core::{
    ActorHandle, Affix, DamageEvent, EliteEngine, InMemoryWorld, Marker, Tier,
};
use glam::Vec3;

use crate::context::{CliContext, DEFAULT_MOB_KIND, SEARCH_RADIUS, run_frame};

fn mob_name(world: &InMemoryWorld, actor: ActorHandle) -> String {
    match world.read::<UnitKind>(actor) {
        Some(UnitKind(kind)) => format!("mob {actor} (kind {kind})"),
        None => format!("mob {actor}"),
    }
}

/// Nearest mob to the player within the search radius
fn nearest_to_player(
    engine: &EliteEngine<InMemoryWorld>,
    ctx: &CliContext,
    elite_only: bool,
) -> Option<ActorHandle> {
    let origin = engine.host().position(ctx.player).unwrap_or(Vec3::ZERO);
    let candidates = engine.host().actors();
    engine
        .nearest_mob(&candidates, origin, elite_only)
        .filter(|actor| {
            engine
                .host()
                .position(*actor)
                .is_some_and(|p| p.distance(origin) <= SEARCH_RADIUS)
        })
}

pub async fn spawn_mob(ctx: &CliContext, hp: f32, count: u32) {
    let origin = ctx.player_position().await;
    let mut engine = ctx.engine.lock().await;
    let template = MobTemplate::new(DEFAULT_MOB_KIND, hp);
    for i in 0..count {
        let offset = Vec3::new(5.0 + 3.0 * i as f32, 0.0, 0.0);
        let actor = engine.host_mut().spawn_mob(&template, origin + offset);
        println!("Spawned mob {actor} with {hp:.0} HP at {:.0}m", offset.length());
    }
}

pub async fn promote(ctx: &CliContext, tier: Tier) {
    let mut engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, false) else {
        println!("No valid mob found nearby.");
        return;
    };
    let name = mob_name(engine.host(), actor);
    if engine.is_elite(actor) {
        println!("{name} is already an elite.");
        return;
    }

    if engine.promote(actor, tier, None) {
        let affixes = engine
            .record(actor)
            .map(|r| r.affix_summary())
            .unwrap_or_default();
        if affixes.is_empty() {
            println!("Promoted {name} to {tier}");
        } else {
            println!("Promoted {name} to {tier} with {affixes}");
        }
    } else {
        println!("Failed to promote {name}.");
    }
}

pub async fn debug_promote(ctx: &CliContext, tier: Tier, affixes: Option<&str>) {
    let forced = match affixes.map(Affix::parse_list).transpose() {
        Ok(list) => list.unwrap_or_default(),
        Err(err) => {
            println!("{err}. Use `affixes` to see options.");
            return;
        }
    };

    let mut engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, false) else {
        println!("No valid mob found nearby.");
        return;
    };
    let name = mob_name(engine.host(), actor);

    let summary = forced
        .iter()
        .map(Affix::name)
        .collect::<Vec<_>>()
        .join(", ");
    if engine.promote(actor, tier, Some(forced)) {
        println!("[DEBUG] Promoted {name} to {tier} [{summary}]");
    } else {
        println!("Failed to promote {name}.");
    }
}

pub async fn info(ctx: &CliContext) {
    let engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, true) else {
        println!("No elite mob found nearby.");
        return;
    };
    let Some(record) = engine.record(actor) else {
        return;
    };

    let health = engine
        .host()
        .read::<Health>(actor)
        .unwrap_or(Health::full(0.0));
    let affixes = if record.affixes.is_empty() {
        "none".to_string()
    } else {
        record.affix_summary()
    };
    println!("{} {}", record.tier, mob_name(engine.host(), actor));
    println!(
        "  HP: {:.0}/{:.0} (orig: {:.0})",
        health.current, health.max, record.baseline.max_health
    );
    println!("  XP Multi: {}x", engine.xp_multiplier(actor));
    println!("  Affixes: {affixes}");
    println!("  Age: {:.0}s", record.age(engine.now()));
}

pub async fn count(ctx: &CliContext) {
    let engine = ctx.engine.lock().await;
    println!("Active elites: {}", engine.active_count());
}

pub async fn clear(ctx: &CliContext) {
    let mut engine = ctx.engine.lock().await;
    engine.cleanup_stale();
    println!("Stale elites cleaned. Active: {}", engine.active_count());
}

pub async fn purge(ctx: &CliContext) {
    let mut engine = ctx.engine.lock().await;
    let count = engine.purge_all();
    println!("Purged {count} elites. All reverted to normal.");
}

pub async fn demote(ctx: &CliContext) {
    let mut engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, true) else {
        println!("No elite found nearby.");
        return;
    };
    let name = mob_name(engine.host(), actor);
    if engine.demote(actor) {
        println!("Demoted {name} back to normal.");
    } else {
        println!("{name} is not a tracked elite.");
    }
}

pub async fn nearby(ctx: &CliContext) {
    let origin = ctx.player_position().await;
    let engine = ctx.engine.lock().await;
    let found = engine.list_near(origin, SEARCH_RADIUS);

    for elite in &found {
        let affixes = if elite.record.affixes.is_empty() {
            String::new()
        } else {
            format!(" [{}]", elite.record.affix_summary())
        };
        println!(
            "  {} {} - {:.0}m away{affixes}",
            elite.record.tier,
            mob_name(engine.host(), elite.actor),
            elite.distance
        );
    }

    if found.is_empty() {
        println!(
            "No elites within {SEARCH_RADIUS:.0} units. Total tracked: {}",
            engine.active_count()
        );
    } else {
        println!(
            "Found {} elite(s) nearby. Total tracked: {}",
            found.len(),
            engine.active_count()
        );
    }
}

pub fn list_affixes() {
    println!("Available affixes:");
    let names: Vec<_> = Affix::ALL.iter().map(|a| a.name().to_lowercase()).collect();
    for row in names.chunks(4) {
        println!("  {}", row.join(", "));
    }
}

pub async fn show_toggles(ctx: &CliContext) {
    let engine = ctx.engine.lock().await;
    let config = engine.config();
    let toggles = &config.toggles;
    println!("Feature toggles (edit the config file to change):");
    println!("  ExcludeFromPersistence: {}", toggles.exclude_from_persistence);
    println!("  ApplyTierAura: {}", toggles.apply_tier_aura);
    println!("  ApplyBolstering: {}", toggles.apply_bolstering);
    println!("  EnableShielded: {}", toggles.enable_shielded);
    println!("  EnablePhasing: {}", toggles.enable_phasing);
    println!("  AffixSampling: {:?}", config.affix_sampling);
    println!("  RestoreDamageReduction: {}", config.restore_damage_reduction);
}

/// The player and the nearest mob trade one blow each
pub async fn hit(ctx: &CliContext, combat: bool) {
    let mut engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, false) else {
        println!("Nothing to hit.");
        return;
    };

    if combat && let Err(err) = engine.host_mut().apply_marker(actor, Marker::InCombat) {
        println!("Could not enter combat: {err}");
    }
    engine.on_damage_batch(&[
        DamageEvent {
            source: ctx.player,
            target: actor,
        },
        DamageEvent {
            source: actor,
            target: ctx.player,
        },
    ]);

    let world = engine.host();
    let mob_hp = world.read::<Health>(actor).map_or(0.0, |h| h.current);
    let player_hp = world.read::<Health>(ctx.player).map_or(0.0, |h| h.current);
    println!(
        "Traded blows with {}: mob HP {mob_hp:.0}, your HP {player_hp:.0}",
        mob_name(world, actor)
    );
}

pub async fn kill(ctx: &CliContext) {
    let mut engine = ctx.engine.lock().await;
    let Some(actor) = nearest_to_player(&engine, ctx, false) else {
        println!("Nothing to kill.");
        return;
    };
    let name = mob_name(engine.host(), actor);
    let max = engine.host().read::<Health>(actor).map_or(0.0, |h| h.max);
    if let Err(err) = engine.host_mut().write(actor, Health { current: 0.0, max }) {
        println!("Could not kill {name}: {err}");
        return;
    }
    let was_elite = engine.is_elite(actor);
    run_frame(&mut engine);
    if was_elite {
        println!("Slew elite {name}.");
    } else {
        println!("Slew {name}.");
    }
}

/// Run `frames` host frames immediately
pub async fn tick(ctx: &CliContext, frames: u32) {
    let mut engine = ctx.engine.lock().await;
    for _ in 0..frames {
        run_frame(&mut engine);
    }
    println!(
        "Ran {frames} frame(s). Active elites: {}, pending spawns: {}",
        engine.active_count(),
        engine.pending_spawns()
    );
}

pub fn exit() {
    let _ = write!(std::io::stdout(), "quitting...");
    let _ = std::io::stdout().flush();
}
