//! Configuration persistence
//!
//! `EliteConfig` itself lives in `elitemobs-types`; this module adds loading
//! and saving through confy (TOML under the platform config directory).

use std::path::Path;

use tracing::{info, warn};

pub use elitemobs_types::{AffixSampling, EliteConfig, FeatureToggles, Tier, TierSettings};

use crate::error::ConfigError;

const APP_NAME: &str = "elitemobs";
const CONFIG_NAME: &str = "config";

/// Extension trait for EliteConfig persistence
pub trait EliteConfigExt: Sized {
    fn load() -> Result<Self, ConfigError>;
    /// Load, falling back to defaults (with a warning) on any error
    fn load_or_default() -> Self;
    fn load_from(path: &Path) -> Result<Self, ConfigError>;
    fn save(&self) -> Result<(), ConfigError>;
    fn save_to(&self, path: &Path) -> Result<(), ConfigError>;
    fn from_toml_str(text: &str) -> Result<Self, ConfigError>;
    fn log_summary(&self);
}

impl EliteConfigExt for EliteConfig {
    fn load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            warn!(error = %err, "Using default elite config");
            Self::default()
        })
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Ok(confy::load_path(path)?)
    }

    fn save(&self) -> Result<(), ConfigError> {
        let path = confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        confy::store_path(path, self).map_err(|source| ConfigError::Save {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn log_summary(&self) {
        let total: f64 = Tier::ALL.iter().map(|t| self.tier(*t).spawn_chance).sum();
        info!(
            enabled = self.enabled,
            champion = self.champion.spawn_chance,
            warlord = self.warlord.spawn_chance,
            apex = self.apex.spawn_chance,
            sampling = ?self.affix_sampling,
            max_lifetime_secs = self.max_lifetime_secs,
            "Elite config"
        );
        if total > 1.0 {
            warn!(total, "Tier spawn chances sum above 1; common tiers are crowded out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_fills_defaults() {
        let cfg = EliteConfig::from_toml_str(
            r#"
            max_lifetime_secs = 60.0

            [apex]
            spawn_chance = 0.5
            hp_multiplier = 3.0
            dmg_multiplier = 1.0
            xp_multiplier = 4.0
            affix_count = 2
            "#,
        )
        .unwrap();

        assert_eq!(cfg.max_lifetime_secs, 60.0);
        assert_eq!(cfg.apex.spawn_chance, 0.5);
        assert_eq!(cfg.warlord, TierSettings::warlord());
        assert!(cfg.enabled);
    }

    #[test]
    fn test_from_toml_str_rejects_bad_types() {
        let err = EliteConfig::from_toml_str("enabled = \"sometimes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_then_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = EliteConfig::default();
        cfg.shield_interval_secs = 9.0;
        cfg.affix_sampling = AffixSampling::WithoutReplacement;
        cfg.save_to(&path).unwrap();

        let loaded = EliteConfig::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
