//! Shared test fixtures

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use elitemobs_types::EliteConfig;
use glam::Vec3;

use crate::engine::EliteEngine;
use crate::host::{ActorHandle, InMemoryWorld, ManualClock, MobTemplate, RandomSource};

#[derive(Default)]
struct Script {
    floats: VecDeque<f64>,
    ints: VecDeque<usize>,
}

/// Random source that replays queued values.
///
/// Clones share the same queues, so a test can keep a handle and feed values
/// after the engine has taken ownership. Once drained, `uniform01` returns
/// 0.999 (no chance-based effect fires) and `uniform_int` returns 0.
#[derive(Clone, Default)]
pub(crate) struct ScriptedRandom {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn floats(self, values: impl IntoIterator<Item = f64>) -> Self {
        self.push_floats(values);
        self
    }

    pub fn ints(self, values: impl IntoIterator<Item = usize>) -> Self {
        self.push_ints(values);
        self
    }

    pub fn push_floats(&self, values: impl IntoIterator<Item = f64>) {
        self.script.lock().unwrap().floats.extend(values);
    }

    pub fn push_ints(&self, values: impl IntoIterator<Item = usize>) {
        self.script.lock().unwrap().ints.extend(values);
    }
}

impl RandomSource for ScriptedRandom {
    fn uniform01(&mut self) -> f64 {
        self.script.lock().unwrap().floats.pop_front().unwrap_or(0.999)
    }

    fn uniform_int(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        let next = self.script.lock().unwrap().ints.pop_front().unwrap_or(0);
        next.min(bound - 1)
    }
}

/// Engine over an in-memory world with a manual clock and scripted randomness
pub(crate) struct Fixture {
    pub engine: EliteEngine<InMemoryWorld>,
    pub clock: ManualClock,
    pub rng: ScriptedRandom,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(EliteConfig::default())
    }

    pub fn with_config(config: EliteConfig) -> Self {
        let clock = ManualClock::at(1000.0);
        let rng = ScriptedRandom::new();
        let engine = EliteEngine::new(
            InMemoryWorld::new(),
            Box::new(clock.clone()),
            Box::new(rng.clone()),
            config,
        );
        Self { engine, clock, rng }
    }

    pub fn now(&self) -> f64 {
        self.engine.now()
    }

    pub fn world(&mut self) -> &mut InMemoryWorld {
        self.engine.host_mut()
    }

    /// Ordinary mob at the origin with the given max health
    pub fn mob(&mut self, max_health: f32) -> ActorHandle {
        self.mob_at(max_health, Vec3::ZERO)
    }

    pub fn mob_at(&mut self, max_health: f32, position: Vec3) -> ActorHandle {
        self.world()
            .spawn_mob(&MobTemplate::new(7, max_health), position)
    }
}
