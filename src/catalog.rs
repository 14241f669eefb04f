// ABOUTME: Sound catalog: the engine's registered sounds, classified for browsing.
// ABOUTME: Loads Strudel-style sound maps from JSON and filters them by category and search text.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Tag Strudel puts on drum machine sample banks.
const DRUM_MACHINES_TAG: &str = "drum-machines";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read sound map: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sound map: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown filter '{0}', expected one of: all, samples, drums, synths, user")]
    UnknownFilter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCategory {
    Sample,
    Drum,
    Synth,
    Soundfont,
}

impl SoundCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Drum => "drum",
            Self::Synth => "synth",
            Self::Soundfont => "soundfont",
        }
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundEntry {
    pub name: String,
    pub category: SoundCategory,
    /// True for sounds the user registered, false for prebaked banks.
    pub is_user_defined: bool,
}

/// Source of the sounds currently known to the engine.
pub trait SoundCatalog {
    fn list(&self) -> Vec<SoundEntry>;
}

/// Category filter offered by the sounds panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoundFilter {
    #[default]
    All,
    Samples,
    Drums,
    Synths,
    User,
}

impl SoundFilter {
    pub fn matches(self, entry: &SoundEntry) -> bool {
        match self {
            Self::All => true,
            Self::Samples => entry.category == SoundCategory::Sample,
            Self::Drums => entry.category == SoundCategory::Drum,
            Self::Synths => matches!(entry.category, SoundCategory::Synth | SoundCategory::Soundfont),
            Self::User => entry.is_user_defined,
        }
    }
}

impl FromStr for SoundFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "samples" => Ok(Self::Samples),
            "drums" => Ok(Self::Drums),
            "synths" => Ok(Self::Synths),
            "user" => Ok(Self::User),
            other => Err(CatalogError::UnknownFilter(other.to_string())),
        }
    }
}

/// Apply the panel's filtering: hide `_`-prefixed internals, match the
/// search text case-insensitively, keep the category, sort by name
/// ignoring case.
pub fn filter_sounds(entries: &[SoundEntry], filter: SoundFilter, search: &str) -> Vec<SoundEntry> {
    let needle = search.to_lowercase();
    let mut out: Vec<SoundEntry> = entries
        .iter()
        .filter(|e| !e.name.starts_with('_'))
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .filter(|e| filter.matches(e))
        .cloned()
        .collect();
    out.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    out
}

#[derive(Debug, Deserialize)]
struct SoundMapEntry {
    data: SoundData,
}

#[derive(Debug, Deserialize)]
struct SoundData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    prebake: bool,
}

impl SoundData {
    fn category(&self) -> SoundCategory {
        match self.kind.as_str() {
            "synth" => SoundCategory::Synth,
            "soundfont" => SoundCategory::Soundfont,
            _ if self.tag.as_deref() == Some(DRUM_MACHINES_TAG) => SoundCategory::Drum,
            _ => SoundCategory::Sample,
        }
    }
}

/// Catalog parsed from a JSON sound map keyed by sound name.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    entries: Vec<SoundEntry>,
}

impl JsonCatalog {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let map: HashMap<String, SoundMapEntry> = serde_json::from_str(json)?;
        let entries = map
            .into_iter()
            .map(|(name, entry)| SoundEntry {
                name,
                category: entry.data.category(),
                is_user_defined: !entry.data.prebake,
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl SoundCatalog for JsonCatalog {
    fn list(&self) -> Vec<SoundEntry> {
        self.entries.clone()
    }
}

/// Small built-in catalog used when no sound map is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCatalog;

impl SoundCatalog for DefaultCatalog {
    fn list(&self) -> Vec<SoundEntry> {
        [
            ("kick", SoundCategory::Drum),
            ("snare", SoundCategory::Drum),
            ("hihat", SoundCategory::Drum),
            ("piano", SoundCategory::Sample),
            ("bass", SoundCategory::Synth),
        ]
        .into_iter()
        .map(|(name, category)| SoundEntry {
            name: name.to_string(),
            category,
            is_user_defined: false,
        })
        .collect()
    }
}
