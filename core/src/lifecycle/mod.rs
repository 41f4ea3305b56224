//! Elite lifecycle: promotion and demotion
//!
//! Promotion captures the actor's baseline stats, scales them, assigns
//! affixes and registers an `EliteRecord`. Demotion is its inverse. Death,
//! timeout and stale cleanup drop records without touching the actor.

mod demotion;
mod promotion;

#[cfg(test)]
mod lifecycle_tests;

/// Flat damage reduction granted per Ironhide affix
pub const IRONHIDE_DAMAGE_REDUCTION: f32 = 0.55;

/// Attack speed factor per Frenzied affix
pub const FRENZIED_ATTACK_SPEED: f32 = 2.0;

/// Seconds after promotion before an Illusionist casts its first decoys
pub const FIRST_DECOY_DELAY_SECS: f64 = 20.0;
