//! Asset manifest: which animation sequences exist on the asset origin and
//! which of them gate the first playable frame.
//!
//! The JSON format groups entries into a `critical` and a `lazy` section, each
//! keyed by entity class and name:
//!
//! ```json
//! {
//!   "version": "0.1",
//!   "critical": {
//!     "player": { "1-Idle": { "path": "Sprites/1-Player-Bomb Guy/1-Idle", "count": 26 } },
//!     "objects": { "tiles": { "blocks": { "file": "Sprites/8-Tile-Sets/blocks.png" } } }
//!   },
//!   "lazy": {
//!     "enemies": { "Cucumber": { "1-Idle": { "path": "Sprites/3-Enemy-Cucumber/1-Idle", "count": 36, "priority": "high" } } }
//!   }
//! }
//! ```
//!
//! Sections are parsed into flat, deterministically ordered entry lists.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::animation::{AnimationSpec, EntityKey, SlotKey};
use crate::path::AssetPath;
use crate::priority::LoadPriority;

pub const MANIFEST_VERSION: &str = "0.1";

/// What to fetch for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSpec {
    /// Numbered frame sequence.
    Frames(AnimationSpec),
    /// One standalone image (tile sheets, backgrounds).
    Single(AssetPath),
}

impl AssetSpec {
    pub fn frame_count(&self) -> u32 {
        match self {
            Self::Frames(spec) => spec.frame_count,
            Self::Single(_) => 1,
        }
    }

    pub fn frame_paths(&self) -> Vec<AssetPath> {
        match self {
            Self::Frames(spec) => spec.frame_paths(),
            Self::Single(path) => vec![path.clone()],
        }
    }

    pub fn truncated(&self, limit: u32) -> Self {
        match self {
            Self::Frames(spec) => Self::Frames(spec.truncated(limit)),
            Self::Single(path) => Self::Single(path.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub slot: SlotKey,
    pub spec: AssetSpec,
    pub priority: Option<LoadPriority>,
}

#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    pub version: String,
    pub critical: Vec<ManifestEntry>,
    pub lazy: Vec<ManifestEntry>,
}

impl AssetManifest {
    /// All entries, critical section first.
    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.critical.iter().chain(self.lazy.iter())
    }

    pub fn find(&self, slot: &SlotKey) -> Option<&ManifestEntry> {
        self.entries().find(|e| &e.slot == slot)
    }

    /// Total frame requests a full load would issue.
    pub fn total_frames(&self) -> u32 {
        self.entries().map(|e| e.spec.frame_count()).sum()
    }

    /// Built-in asset list for the Pirate Bomb sprite pack.
    pub fn pirate_bomb() -> Self {
        let player = |anim: &str, count: u32| ManifestEntry {
            slot: SlotKey::player(anim),
            spec: AssetSpec::Frames(AnimationSpec::new(
                AssetPath::new("Sprites/1-Player-Bomb Guy").join(anim),
                count,
            )),
            priority: None,
        };
        let enemy = |folder: &str, name: &str, anim: &str, count: u32| ManifestEntry {
            slot: SlotKey::enemy(name, anim),
            spec: AssetSpec::Frames(AnimationSpec::new(
                AssetPath::new("Sprites").join(folder).join(anim),
                count,
            )),
            priority: None,
        };
        let object = |object: &str, anim: &str, count: u32| ManifestEntry {
            slot: SlotKey::object(object, anim),
            spec: AssetSpec::Frames(AnimationSpec::new(
                AssetPath::new("Sprites/7-Objects").join(object).join(anim),
                count,
            )),
            priority: None,
        };
        let tile = |name: &str, priority: Option<LoadPriority>| ManifestEntry {
            slot: SlotKey::object("tiles", name),
            spec: AssetSpec::Single(AssetPath::new(&format!("Sprites/8-Tile-Sets/{name}.png"))),
            priority,
        };

        let bald = "2-Enemy-Bald Pirate";
        let critical = vec![
            player("1-Idle", 26),
            player("2-Run", 14),
            player("4-Jump", 4),
            player("5-Fall", 2),
            enemy(bald, "Bald Pirate", "1-Idle", 34),
            enemy(bald, "Bald Pirate", "2-Run", 14),
            enemy(bald, "Bald Pirate", "4-Jump", 4),
            object("1-BOMB", "1-Bomb Off", 1),
            object("1-BOMB", "2-Bomb On", 10),
            object("2-Door", "1-Closed", 1),
            tile("blocks", None),
        ];

        let mut lazy = vec![
            player("3-Jump Anticipation", 1),
            player("6-Ground", 3),
            player("7-Hit", 8),
            player("8-Dead Hit", 6),
            player("9-Dead Ground", 4),
            player("10-Door In", 16),
            player("11-Door Out", 16),
            enemy(bald, "Bald Pirate", "3-Jump Anticipation", 1),
            enemy(bald, "Bald Pirate", "5-Fall", 2),
            enemy(bald, "Bald Pirate", "6-Ground", 3),
            enemy(bald, "Bald Pirate", "7-Attack", 12),
            enemy(bald, "Bald Pirate", "8-Hit", 8),
            enemy(bald, "Bald Pirate", "9-Dead Hit", 6),
            enemy(bald, "Bald Pirate", "10-Dead Ground", 4),
            enemy("3-Enemy-Cucumber", "Cucumber", "1-Idle", 36),
            enemy("3-Enemy-Cucumber", "Cucumber", "2-Run", 12),
            enemy("4-Enemy-Big Guy", "Big Guy", "1-Idle", 4),
            enemy("5-Enemy-Captain", "Captain", "1-Idle", 4),
        ];
        for name in ["block2", "block3", "block4", "block5", "block6"] {
            lazy.push(tile(name, Some(LoadPriority::Low)));
        }

        Self {
            version: MANIFEST_VERSION.to_string(),
            critical,
            lazy,
        }
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct ManifestJson {
    version: String,
    #[serde(default)]
    critical: SectionJson,
    #[serde(default)]
    lazy: SectionJson,
}

#[derive(Debug, Default, Deserialize)]
struct SectionJson {
    #[serde(default)]
    player: BTreeMap<String, EntryJson>,
    #[serde(default)]
    enemies: BTreeMap<String, BTreeMap<String, EntryJson>>,
    #[serde(default)]
    objects: BTreeMap<String, BTreeMap<String, EntryJson>>,
    #[serde(default)]
    backgrounds: BTreeMap<String, BTreeMap<String, EntryJson>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntryJson {
    Frames {
        path: String,
        count: u32,
        #[serde(default)]
        priority: Option<LoadPriority>,
    },
    Single {
        file: String,
        #[serde(default)]
        priority: Option<LoadPriority>,
    },
}

impl SectionJson {
    fn into_entries(self) -> Vec<ManifestEntry> {
        let mut entries = Vec::new();
        for (anim, entry) in self.player {
            entries.push(entry.into_entry(SlotKey::player(&anim)));
        }
        push_group(&mut entries, self.enemies, EntityKey::Enemy);
        push_group(&mut entries, self.objects, EntityKey::Object);
        push_group(&mut entries, self.backgrounds, EntityKey::Background);
        entries
    }
}

fn push_group(
    entries: &mut Vec<ManifestEntry>,
    group: BTreeMap<String, BTreeMap<String, EntryJson>>,
    make_entity: fn(String) -> EntityKey,
) {
    for (name, anims) in group {
        for (anim, entry) in anims {
            entries.push(entry.into_entry(SlotKey::new(make_entity(name.clone()), &anim)));
        }
    }
}

impl EntryJson {
    fn into_entry(self, slot: SlotKey) -> ManifestEntry {
        match self {
            Self::Frames {
                path,
                count,
                priority,
            } => ManifestEntry {
                slot,
                spec: AssetSpec::Frames(AnimationSpec::new(AssetPath::new(&path), count)),
                priority,
            },
            Self::Single { file, priority } => ManifestEntry {
                slot,
                spec: AssetSpec::Single(AssetPath::new(&file)),
                priority,
            },
        }
    }
}

/// Parse and validate a manifest from a JSON string.
pub fn parse_manifest(raw: &str) -> Result<AssetManifest, String> {
    let json: ManifestJson =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse asset manifest: {e}"))?;
    let manifest = AssetManifest {
        version: json.version,
        critical: json.critical.into_entries(),
        lazy: json.lazy.into_entries(),
    };
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Load an asset manifest from disk.
pub fn load_manifest_from_path(path: &Path) -> Result<AssetManifest, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read asset manifest {}: {e}", path.display()))?;
    let manifest = parse_manifest(&raw).map_err(|e| format!("{} ({})", e, path.display()))?;
    log::info!(
        "Asset manifest loaded from {}: {} critical, {} lazy entries",
        path.display(),
        manifest.critical.len(),
        manifest.lazy.len()
    );
    Ok(manifest)
}

pub fn validate_manifest(manifest: &AssetManifest) -> Result<(), String> {
    if manifest.version != MANIFEST_VERSION {
        return Err(format!(
            "Manifest validation failed: unsupported version '{}'",
            manifest.version
        ));
    }
    let mut seen = HashSet::new();
    for entry in manifest.entries() {
        if !seen.insert(&entry.slot) {
            return Err(format!(
                "Manifest validation failed: slot '{}' declared more than once",
                entry.slot
            ));
        }
        if entry.slot.animation.is_empty() {
            return Err(format!(
                "Manifest validation failed: empty animation name under '{}'",
                entry.slot.entity
            ));
        }
        match &entry.spec {
            AssetSpec::Frames(spec) => {
                if spec.path.is_empty() {
                    return Err(format!(
                        "Manifest validation failed: slot '{}' has empty path",
                        entry.slot
                    ));
                }
                if spec.frame_count == 0 {
                    return Err(format!(
                        "Manifest validation failed: slot '{}' has zero frames",
                        entry.slot
                    ));
                }
            }
            AssetSpec::Single(path) => {
                if path.is_empty() {
                    return Err(format!(
                        "Manifest validation failed: slot '{}' has empty file",
                        entry.slot
                    ));
                }
            }
        }
    }
    Ok(())
}
