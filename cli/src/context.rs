use std::sync::Arc;
use std::time::Duration;

use elitemobs_core::config::EliteConfigExt;
use elitemobs_core::host::{EntityStore, Health, MobTemplate};
use elitemobs_core::{
    ActorHandle, EliteConfig, EliteEngine, InMemoryWorld, MonotonicClock, SeededRandom,
};
use glam::Vec3;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

pub type SharedEngine = Arc<Mutex<EliteEngine<InMemoryWorld>>>;

/// Radius used for "nearest" and `nearby` lookups around the player
pub const SEARCH_RADIUS: f32 = 50.0;

/// Template for mobs created with `spawn-mob`
pub const DEFAULT_MOB_KIND: i32 = 7;

#[derive(Default)]
pub struct BackgroundTasks {
    pub ticker: Option<JoinHandle<()>>,
}

/// Holds all shared state for the REPL: the engine over an in-memory world,
/// and the admin's own player actor that "nearest" lookups start from.
#[derive(Clone)]
pub struct CliContext {
    pub engine: SharedEngine,
    pub player: ActorHandle,
    pub tasks: Arc<Mutex<BackgroundTasks>>,
}

impl CliContext {
    pub fn new(config: EliteConfig) -> Self {
        config.log_summary();

        let mut world = InMemoryWorld::new();
        world.register_template(MobTemplate::new(DEFAULT_MOB_KIND, 100.0));
        let player = world.spawn_player(Vec3::ZERO, 1000.0);

        let engine = EliteEngine::new(
            world,
            Box::new(MonotonicClock::new()),
            Box::new(SeededRandom::from_entropy()),
            config,
        );

        Self {
            engine: Arc::new(Mutex::new(engine)),
            player,
            tasks: Arc::new(Mutex::new(BackgroundTasks::default())),
        }
    }

    pub fn load() -> Self {
        Self::new(EliteConfig::load_or_default())
    }

    /// Start the background task that drives scanning, ticking, spawn
    /// completion and death detection.
    pub async fn start_ticker(&self, period: Duration) {
        let engine = Arc::clone(&self.engine);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let mut engine = engine.lock().await;
                run_frame(&mut engine);
            }
        });

        if let Some(old) = self.tasks.lock().await.ticker.replace(handle) {
            old.abort();
        }
    }

    pub async fn stop_ticker(&self) {
        if let Some(handle) = self.tasks.lock().await.ticker.take() {
            handle.abort();
        }
    }

    pub async fn player_position(&self) -> Vec3 {
        let engine = self.engine.lock().await;
        engine.host().position(self.player).unwrap_or(Vec3::ZERO)
    }
}

/// One host frame: report finished spawns and deaths, then scan and tick.
pub fn run_frame(engine: &mut EliteEngine<InMemoryWorld>) {
    let spawned = engine.host_mut().complete_spawns();
    for (actor, ticket) in spawned {
        engine.on_actor_spawned(actor, ticket);
    }

    let world = engine.host();
    let dead: Vec<_> = world
        .actors()
        .into_iter()
        .filter(|a| world.read::<Health>(*a).is_some_and(|h| h.current <= 0.0))
        .collect();
    if !dead.is_empty() {
        engine.on_deaths(&dead);
        for actor in dead {
            if let Err(err) = engine.host_mut().destroy(actor) {
                debug!(%actor, error = %err, "Corpse already gone");
            }
        }
    }

    let now = engine.now();
    let candidates = engine.host().actors();
    engine.scan(now, &candidates);
    engine.tick(now);
}
