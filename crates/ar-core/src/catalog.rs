//! Sound Catalog
//!
//! One static table maps logical sound keys to loadable assets:
//! - canonical keys (`ambience/cabin_rain.mp3`, `effects/thunder.mp3`)
//! - bare-filename legacy aliases (`cabin_rain.mp3`)
//! - semantic aliases used by the soundscape service (`indoors.mp3`)
//!
//! The trigger dictionary maps normalized words onto effect keys. The whole
//! catalog is checked once at startup with [`SoundCatalog::validate`] so a
//! missing sound fails loudly instead of turning into silent pages.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::collections::HashMap;

/// What a sound is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    /// Looping ambient background
    Carpet,
    /// One-shot effect fired by a trigger word
    Effect,
}

/// A loadable sound asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SoundAsset {
    /// Canonical logical key
    pub key: &'static str,
    /// Path relative to the asset root
    pub path: &'static str,
    pub kind: SoundKind,
}

impl SoundAsset {
    pub const fn carpet(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: SoundKind::Carpet,
        }
    }

    pub const fn effect(key: &'static str, path: &'static str) -> Self {
        Self {
            key,
            path,
            kind: SoundKind::Effect,
        }
    }
}

/// Built-in asset table
pub static BUILTIN_ASSETS: &[SoundAsset] = &[
    SoundAsset::carpet("ambience/cabin_rain.mp3", "ambience/cabin_rain.mp3"),
    SoundAsset::carpet("ambience/forest_night.mp3", "ambience/forest_night.mp3"),
    SoundAsset::carpet("ambience/fireplace.mp3", "ambience/fireplace.mp3"),
    SoundAsset::carpet("ambience/city_street.mp3", "ambience/city_street.mp3"),
    SoundAsset::carpet("ambience/ocean_waves.mp3", "ambience/ocean_waves.mp3"),
    SoundAsset::carpet("ambience/windy_moor.mp3", "ambience/windy_moor.mp3"),
    SoundAsset::carpet("ambience/tavern.mp3", "ambience/tavern.mp3"),
    SoundAsset::effect("effects/thunder.mp3", "effects/thunder.mp3"),
    SoundAsset::effect("effects/footsteps.mp3", "effects/footsteps.mp3"),
    SoundAsset::effect("effects/wind_gust.mp3", "effects/wind_gust.mp3"),
    SoundAsset::effect("effects/storm.mp3", "effects/storm.mp3"),
    SoundAsset::effect("effects/rain_burst.mp3", "effects/rain_burst.mp3"),
    SoundAsset::effect("effects/door_creak.mp3", "effects/door_creak.mp3"),
    SoundAsset::effect("effects/knock.mp3", "effects/knock.mp3"),
    SoundAsset::effect("effects/scream.mp3", "effects/scream.mp3"),
    SoundAsset::effect("effects/bell.mp3", "effects/bell.mp3"),
    SoundAsset::effect("effects/wolf_howl.mp3", "effects/wolf_howl.mp3"),
    SoundAsset::effect("effects/owl.mp3", "effects/owl.mp3"),
    SoundAsset::effect("effects/glass_shatter.mp3", "effects/glass_shatter.mp3"),
    SoundAsset::effect("effects/horse.mp3", "effects/horse.mp3"),
    SoundAsset::effect("effects/gunshot.mp3", "effects/gunshot.mp3"),
];

/// Legacy and semantic aliases → canonical key
pub static BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Bare filenames from the first asset layout
    ("cabin_rain.mp3", "ambience/cabin_rain.mp3"),
    ("forest_night.mp3", "ambience/forest_night.mp3"),
    ("fireplace.mp3", "ambience/fireplace.mp3"),
    ("city_street.mp3", "ambience/city_street.mp3"),
    ("ocean_waves.mp3", "ambience/ocean_waves.mp3"),
    ("thunder.mp3", "effects/thunder.mp3"),
    ("footsteps.mp3", "effects/footsteps.mp3"),
    ("door_creak.mp3", "effects/door_creak.mp3"),
    // Semantic names returned by the soundscape service
    ("indoors.mp3", "ambience/fireplace.mp3"),
    ("outdoors.mp3", "ambience/forest_night.mp3"),
    ("rain.mp3", "ambience/cabin_rain.mp3"),
    ("city.mp3", "ambience/city_street.mp3"),
    ("sea.mp3", "ambience/ocean_waves.mp3"),
    ("wind.mp3", "ambience/windy_moor.mp3"),
    ("crowd.mp3", "ambience/tavern.mp3"),
];

/// Normalized trigger word → effect key
pub static BUILTIN_TRIGGERS: &[(&str, &str)] = &[
    ("thunder", "effects/thunder.mp3"),
    ("lightning", "effects/thunder.mp3"),
    ("footsteps", "effects/footsteps.mp3"),
    ("wind", "effects/wind_gust.mp3"),
    ("storm", "effects/storm.mp3"),
    ("rain", "effects/rain_burst.mp3"),
    ("door", "effects/door_creak.mp3"),
    ("knock", "effects/knock.mp3"),
    ("knocked", "effects/knock.mp3"),
    ("scream", "effects/scream.mp3"),
    ("screamed", "effects/scream.mp3"),
    ("bell", "effects/bell.mp3"),
    ("bells", "effects/bell.mp3"),
    ("wolf", "effects/wolf_howl.mp3"),
    ("howl", "effects/wolf_howl.mp3"),
    ("owl", "effects/owl.mp3"),
    ("glass", "effects/glass_shatter.mp3"),
    ("horse", "effects/horse.mp3"),
    ("gunshot", "effects/gunshot.mp3"),
];

/// Carpet keys the soundscape service is known to return
pub static SERVICE_VOCABULARY: &[&str] = &[
    "ambience/cabin_rain.mp3",
    "ambience/forest_night.mp3",
    "ambience/fireplace.mp3",
    "ambience/city_street.mp3",
    "ambience/ocean_waves.mp3",
    "indoors.mp3",
    "outdoors.mp3",
    "rain.mp3",
    "city.mp3",
    "sea.mp3",
    "wind.mp3",
    "crowd.mp3",
];

/// Indexed view over the static tables
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    assets: HashMap<&'static str, &'static SoundAsset>,
    aliases: HashMap<&'static str, &'static str>,
    triggers: HashMap<&'static str, &'static str>,
    vocabulary: &'static [&'static str],
}

impl Default for SoundCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SoundCatalog {
    /// Catalog over the built-in tables
    pub fn builtin() -> Self {
        Self::from_tables(
            BUILTIN_ASSETS,
            BUILTIN_ALIASES,
            BUILTIN_TRIGGERS,
            SERVICE_VOCABULARY,
        )
    }

    /// Catalog over caller-supplied tables
    pub fn from_tables(
        assets: &'static [SoundAsset],
        aliases: &'static [(&'static str, &'static str)],
        triggers: &'static [(&'static str, &'static str)],
        vocabulary: &'static [&'static str],
    ) -> Self {
        Self {
            assets: assets.iter().map(|a| (a.key, a)).collect(),
            aliases: aliases.iter().copied().collect(),
            triggers: triggers.iter().copied().collect(),
            vocabulary,
        }
    }

    /// Resolve any known key (canonical, alias, or a path ending in an alias).
    ///
    /// Unknown keys resolve to `None`.
    pub fn resolve(&self, key: &str) -> Option<&'static SoundAsset> {
        let key = key.trim();
        if let Some(asset) = self.assets.get(key) {
            return Some(*asset);
        }
        if let Some(canonical) = self.aliases.get(key) {
            return self.assets.get(canonical).copied();
        }
        let file_name = key.rsplit('/').next()?;
        if file_name.len() != key.len() {
            if let Some(canonical) = self.aliases.get(file_name) {
                return self.assets.get(canonical).copied();
            }
        }
        None
    }

    /// Effect key for an already-normalized word
    #[inline]
    pub fn trigger_sound(&self, normalized_word: &str) -> Option<&'static str> {
        self.triggers.get(normalized_word).copied()
    }

    /// Number of dictionary entries
    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    /// Every canonical key
    pub fn asset_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.assets.keys().copied()
    }

    /// Check the tables against each other.
    ///
    /// - every alias points at a known asset
    /// - every trigger word is normalized and points at an effect
    /// - every service vocabulary key resolves to a carpet
    pub fn validate(&self) -> CoreResult<()> {
        let mut missing = Vec::new();

        for (alias, canonical) in &self.aliases {
            if !self.assets.contains_key(canonical) {
                missing.push(format!("alias {} -> {}", alias, canonical));
            }
        }

        for (word, key) in &self.triggers {
            let normalized = word
                .chars()
                .all(|c| c.is_alphanumeric() && !c.is_uppercase());
            if !normalized {
                missing.push(format!("trigger '{}' is not normalized", word));
            }
            match self.assets.get(key) {
                Some(asset) if asset.kind == SoundKind::Effect => {}
                Some(_) => missing.push(format!("trigger {} -> {} is not an effect", word, key)),
                None => missing.push(format!("trigger {} -> {}", word, key)),
            }
        }

        for key in self.vocabulary {
            match self.resolve(key) {
                Some(asset) if asset.kind == SoundKind::Carpet => {}
                Some(_) => missing.push(format!("service key {} is not a carpet", key)),
                None => missing.push(format!("service key {}", key)),
            }
        }

        if missing.is_empty() {
            log::debug!(
                "[Catalog] {} assets, {} aliases, {} trigger words validated",
                self.assets.len(),
                self.aliases.len(),
                self.triggers.len()
            );
            Ok(())
        } else {
            missing.sort();
            Err(CoreError::IncompleteCatalog { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_complete() {
        SoundCatalog::builtin().validate().unwrap();
    }

    #[test]
    fn test_resolve_aliases() {
        let catalog = SoundCatalog::builtin();
        let canonical = catalog.resolve("ambience/cabin_rain.mp3").unwrap();
        assert_eq!(catalog.resolve("cabin_rain.mp3"), Some(canonical));
        assert_eq!(catalog.resolve("rain.mp3"), Some(canonical));
        assert_eq!(catalog.resolve("  rain.mp3 "), Some(canonical));
        assert_eq!(
            catalog.resolve("indoors.mp3").map(|a| a.key),
            Some("ambience/fireplace.mp3")
        );
        assert_eq!(
            catalog.resolve("sounds/legacy/thunder.mp3").map(|a| a.key),
            Some("effects/thunder.mp3")
        );
    }

    #[test]
    fn test_unknown_key_is_none() {
        let catalog = SoundCatalog::builtin();
        assert!(catalog.resolve("ambience/dragon_lair.mp3").is_none());
        assert!(catalog.resolve("").is_none());
    }

    #[test]
    fn test_trigger_dictionary() {
        let catalog = SoundCatalog::builtin();
        assert_eq!(catalog.trigger_sound("storm"), Some("effects/storm.mp3"));
        assert_eq!(catalog.trigger_sound("thunder"), Some("effects/thunder.mp3"));
        assert!(catalog.trigger_sound("Storm").is_none());
        assert!(catalog.trigger_sound("teacup").is_none());
    }

    static BROKEN_ASSETS: &[SoundAsset] = &[
        SoundAsset::carpet("ambience/a.mp3", "a.mp3"),
        SoundAsset::effect("effects/b.mp3", "b.mp3"),
    ];
    static BROKEN_ALIASES: &[(&str, &str)] = &[("c.mp3", "ambience/c.mp3")];
    static BROKEN_TRIGGERS: &[(&str, &str)] =
        &[("Boom", "effects/b.mp3"), ("hum", "ambience/a.mp3")];
    static BROKEN_VOCABULARY: &[&str] = &["ambience/a.mp3", "effects/b.mp3", "nowhere.mp3"];

    #[test]
    fn test_validate_reports_every_gap() {
        let catalog = SoundCatalog::from_tables(
            BROKEN_ASSETS,
            BROKEN_ALIASES,
            BROKEN_TRIGGERS,
            BROKEN_VOCABULARY,
        );
        match catalog.validate() {
            Err(CoreError::IncompleteCatalog { missing }) => {
                assert_eq!(missing.len(), 5, "{:?}", missing);
                assert!(missing.iter().any(|m| m.contains("nowhere.mp3")));
                assert!(missing.iter().any(|m| m.contains("'Boom'")));
            }
            other => panic!("expected incomplete catalog, got {:?}", other),
        }
    }
}
