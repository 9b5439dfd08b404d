//! Soundscape response model

use ar_core::{SoundAsset, SoundCatalog, SoundKind};
use serde::{Deserialize, Deserializer, Serialize};

/// Service answer for one page. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundscapeResponse {
    /// Ambient candidates, first one wins
    #[serde(default, deserialize_with = "null_as_empty")]
    pub carpet_tracks: Vec<String>,
    /// Words the service wants to sound on this page
    #[serde(default, deserialize_with = "null_as_empty")]
    pub triggered_sounds: Vec<TriggeredSound>,
}

/// A service-reported trigger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredSound {
    pub word: String,
    /// Word index within the page, if the service knows it
    #[serde(default)]
    pub position: Option<usize>,
    /// Explicit asset key, overriding the trigger dictionary
    #[serde(default)]
    pub file: Option<String>,
}

impl SoundscapeResponse {
    /// Parse a response body
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Carpet key requested for the page, if any
    pub fn carpet_key(&self) -> Option<&str> {
        self.carpet_tracks
            .first()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
    }

    /// Resolve the requested carpet. `None` means the page should be silent.
    pub fn carpet_asset(&self, catalog: &SoundCatalog) -> Option<&'static SoundAsset> {
        let key = self.carpet_key()?;
        match catalog.resolve(key) {
            Some(asset) if asset.kind == SoundKind::Carpet => Some(asset),
            Some(asset) => {
                log::debug!("[Soundscape] '{}' is not an ambient track ({})", key, asset.key);
                None
            }
            None => {
                log::debug!("[Soundscape] Unknown carpet '{}'", key);
                None
            }
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
