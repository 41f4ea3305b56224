//! Error types for the elite engine
//!
//! Operations use these internally with `?`; the public entry points catch
//! them at the boundary, log, and report a bool or a skip instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::{ActorHandle, HostError};

#[derive(Debug, Error)]
pub enum PromotionError {
    #[error("actor {actor} no longer exists")]
    ActorGone { actor: ActorHandle },

    #[error("failed to commit promotion of {actor}")]
    Commit {
        actor: ActorHandle,
        #[source]
        source: HostError,
    },
}

#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("no free spawn ticket after {attempts} attempts")]
    KeySpaceExhausted { attempts: u32 },

    #[error("spawn request failed")]
    Spawn(#[from] HostError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config")]
    Load(#[from] confy::ConfyError),

    #[error("failed to save config to {path}")]
    Save {
        path: PathBuf,
        #[source]
        source: confy::ConfyError,
    },

    #[error("invalid config TOML")]
    Parse(#[from] toml::de::Error),
}
