//! Static catalog of every animation slot the render loop may query, plus the
//! alias table used when a slot has no frames of its own.
//!
//! Every enemy type gets the same animation list, so the render loop can look
//! up any `(enemy, animation)` pair without checking for existence first.

use kaboom_core::{AssetPath, EntityKey, SlotKey};

pub const PLAYER_ANIMATIONS: &[&str] = &[
    "1-Idle",
    "2-Run",
    "3-Jump Anticipation",
    "4-Jump",
    "5-Fall",
    "6-Ground",
    "7-Hit",
    "8-Dead Hit",
    "9-Dead Ground",
    "10-Door In",
    "11-Door Out",
];

pub const ENEMY_ANIMATIONS: &[&str] = &[
    "1-Idle",
    "2-Run",
    "3-Jump Anticipation",
    "4-Jump",
    "5-Fall",
    "6-Ground",
    "7-Attack",
    "8-Hit",
    "9-Dead Hit",
    "10-Dead Ground",
];

/// Enemy type names with their sprite-pack folder number.
pub const ENEMY_TYPES: &[(&str, u32)] = &[
    ("Bald Pirate", 2),
    ("Cucumber", 3),
    ("Big Guy", 4),
    ("Captain", 5),
    ("Whale", 6),
];

pub const OBJECT_ANIMATIONS: &[(&str, &[&str])] = &[
    ("1-BOMB", &["1-Bomb Off", "2-Bomb On", "3-Explotion"]),
    ("2-Door", &["1-Closed", "2-Opening", "3-Closing"]),
    ("tiles", &["blocks"]),
];

/// Folder holding an enemy type's animations, e.g. `Sprites/2-Enemy-Bald Pirate`.
pub fn enemy_folder(name: &str) -> Option<AssetPath> {
    ENEMY_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, folder)| AssetPath::new("Sprites").join(&format!("{folder}-Enemy-{n}")))
}

/// Ordered substitutes for a missing animation. Only animations of the same
/// entity that loaded directly are eligible; aliases are never chained.
pub fn alias_candidates(entity: &EntityKey, animation: &str) -> &'static [&'static str] {
    match entity {
        EntityKey::Player => match animation {
            "1-Idle" => &[],
            "5-Fall" => &["4-Jump", "1-Idle"],
            "8-Dead Hit" => &["7-Hit", "1-Idle"],
            "9-Dead Ground" => &["8-Dead Hit", "7-Hit", "1-Idle"],
            "11-Door Out" => &["10-Door In", "1-Idle"],
            _ => &["1-Idle"],
        },
        EntityKey::Enemy(_) => match animation {
            "1-Idle" => &[],
            "5-Fall" => &["4-Jump", "1-Idle"],
            "9-Dead Hit" => &["8-Hit", "1-Idle"],
            "10-Dead Ground" => &["9-Dead Hit", "8-Hit", "1-Idle"],
            _ => &["1-Idle"],
        },
        EntityKey::Object(name) => match (name.as_str(), animation) {
            ("1-BOMB", "2-Bomb On") => &["1-Bomb Off"],
            ("1-BOMB", "3-Explotion") => &["2-Bomb On", "1-Bomb Off"],
            ("2-Door", "2-Opening" | "3-Closing") => &["1-Closed"],
            _ => &[],
        },
        EntityKey::Background(_) => &[],
    }
}

/// The full set of slots the asset table must always answer.
#[derive(Debug, Clone)]
pub struct Catalog {
    player: Vec<String>,
    enemy_types: Vec<String>,
    enemy_animations: Vec<String>,
    objects: Vec<(String, Vec<String>)>,
    backgrounds: Vec<(String, Vec<String>)>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn named<'a>(groups: &'a [(String, Vec<String>)], name: &str) -> &'a [String] {
    groups
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, anims)| anims.as_slice())
        .unwrap_or(&[])
}

impl Catalog {
    pub fn pirate_bomb() -> Self {
        Self {
            player: owned(PLAYER_ANIMATIONS),
            enemy_types: ENEMY_TYPES.iter().map(|(n, _)| n.to_string()).collect(),
            enemy_animations: owned(ENEMY_ANIMATIONS),
            objects: OBJECT_ANIMATIONS
                .iter()
                .map(|(name, anims)| (name.to_string(), owned(anims)))
                .collect(),
            backgrounds: Vec::new(),
        }
    }

    pub fn with_background(mut self, name: &str, animations: &[&str]) -> Self {
        self.backgrounds.push((name.to_string(), owned(animations)));
        self
    }

    pub fn enemy_types(&self) -> &[String] {
        &self.enemy_types
    }

    /// Every entity the catalog covers, player first.
    pub fn entities(&self) -> Vec<EntityKey> {
        let mut out = vec![EntityKey::Player];
        out.extend(self.enemy_types.iter().cloned().map(EntityKey::Enemy));
        out.extend(self.objects.iter().map(|(n, _)| EntityKey::Object(n.clone())));
        out.extend(self.backgrounds.iter().map(|(n, _)| EntityKey::Background(n.clone())));
        out
    }

    /// Required animation names for `entity`; empty if it is not catalogued.
    pub fn animations(&self, entity: &EntityKey) -> &[String] {
        match entity {
            EntityKey::Player => &self.player,
            EntityKey::Enemy(name) if self.enemy_types.contains(name) => &self.enemy_animations,
            EntityKey::Enemy(_) => &[],
            EntityKey::Object(name) => named(&self.objects, name),
            EntityKey::Background(name) => named(&self.backgrounds, name),
        }
    }

    pub fn contains(&self, slot: &SlotKey) -> bool {
        self.animations(&slot.entity)
            .iter()
            .any(|a| *a == slot.animation)
    }

    /// Every `(entity, animation)` pair the render loop may query.
    pub fn required_slots(&self) -> Vec<SlotKey> {
        self.entities()
            .into_iter()
            .flat_map(|entity| {
                self.animations(&entity)
                    .iter()
                    .map(|anim| SlotKey::new(entity.clone(), anim))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
