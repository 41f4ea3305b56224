pub mod combat;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod registry;
pub mod scanner;
pub mod scheduler;
pub mod selector;
pub mod spawn;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use combat::DamageEvent;
pub use config::EliteConfigExt;
pub use elitemobs_types::{Affix, AffixSampling, EliteConfig, FeatureToggles, ParseNameError, Tier};
pub use engine::{EliteEngine, NearbyElite};
pub use error::{ConfigError, CorrelatorError, PromotionError};
pub use host::{
    ActorHandle, Capability, Clock, Host, HostError, InMemoryWorld, ManualClock, Marker,
    MobTemplate, MonotonicClock, RandomSource, SeededRandom, SpawnTicket,
};
pub use registry::{EliteRecord, EliteRegistry};
pub use scanner::ScanReport;
pub use scheduler::TickReport;
pub use selector::TierSelector;
