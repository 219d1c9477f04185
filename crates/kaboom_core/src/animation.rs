//! Frame-sequence animation types and deterministic playback.
//!
//! Sprite animations on the asset origin are numbered PNG sequences:
//! `<path>/1.png .. <path>/<frame_count>.png`. An `AnimationSpec` describes one
//! such sequence; `SlotKey` names where the loaded frames live in the asset
//! table (`player/1-Idle`, `enemy:Whale/8-Hit`, ...).
//!
//! Playback timing uses integer microseconds (`u64`) so advancing a cursor is
//! identical on every platform. The cursor never stores a frame reference,
//! only an index, because the sequence it indexes may be swapped for a longer
//! one while it plays.

use std::fmt;

use crate::path::AssetPath;

/// A numbered frame sequence under a base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationSpec {
    pub path: AssetPath,
    pub frame_count: u32,
}

impl AnimationSpec {
    pub fn new(path: impl Into<AssetPath>, frame_count: u32) -> Self {
        Self {
            path: path.into(),
            frame_count,
        }
    }

    /// Path of frame `index` (1-based).
    pub fn frame_path(&self, index: u32) -> AssetPath {
        self.path.join(&format!("{index}.png"))
    }

    /// Frame paths in declared order, `1..=frame_count`.
    pub fn frame_paths(&self) -> Vec<AssetPath> {
        (1..=self.frame_count).map(|i| self.frame_path(i)).collect()
    }

    /// The same sequence cut down to at most `limit` leading frames (never zero).
    pub fn truncated(&self, limit: u32) -> Self {
        Self {
            path: self.path.clone(),
            frame_count: self.frame_count.min(limit.max(1)),
        }
    }
}

/// Which entity an animation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Player,
    Enemy(String),
    Object(String),
    Background(String),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => f.write_str("player"),
            Self::Enemy(name) => write!(f, "enemy:{name}"),
            Self::Object(name) => write!(f, "object:{name}"),
            Self::Background(name) => write!(f, "background:{name}"),
        }
    }
}

/// One addressable animation slot in the asset table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub entity: EntityKey,
    pub animation: String,
}

impl SlotKey {
    pub fn new(entity: EntityKey, animation: &str) -> Self {
        Self {
            entity,
            animation: animation.to_string(),
        }
    }

    pub fn player(animation: &str) -> Self {
        Self::new(EntityKey::Player, animation)
    }

    pub fn enemy(enemy: &str, animation: &str) -> Self {
        Self::new(EntityKey::Enemy(enemy.to_string()), animation)
    }

    pub fn object(object: &str, animation: &str) -> Self {
        Self::new(EntityKey::Object(object.to_string()), animation)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity, self.animation)
    }
}

/// Runtime playback position for one animated sprite.
#[derive(Debug, Clone)]
pub struct AnimationCursor {
    pub frame_duration_us: u64,
    pub looping: bool,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationCursor {
    pub fn new(frame_duration_us: u64, looping: bool) -> Self {
        Self {
            frame_duration_us: frame_duration_us.max(1),
            looping,
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Restart from the first frame (on animation change).
    pub fn reset(&mut self) {
        self.frame_index = 0;
        self.elapsed_us = 0;
        self.finished = false;
    }

    /// Advance by `dt_us` over a sequence of `frame_count` frames and return the
    /// index to draw. A shrinking or growing `frame_count` between calls is
    /// tolerated.
    pub fn tick(&mut self, dt_us: u64, frame_count: usize) -> usize {
        if frame_count == 0 {
            return 0;
        }
        if self.frame_index >= frame_count {
            self.frame_index = if self.looping {
                self.frame_index % frame_count
            } else {
                frame_count - 1
            };
        }
        if self.finished {
            return frame_count - 1;
        }

        self.elapsed_us += dt_us;
        let steps = self.elapsed_us / self.frame_duration_us;
        self.elapsed_us %= self.frame_duration_us;

        let target = self.frame_index as u64 + steps;
        if target < frame_count as u64 {
            self.frame_index = target as usize;
        } else if self.looping {
            self.frame_index = (target % frame_count as u64) as usize;
        } else {
            self.frame_index = frame_count - 1;
            self.elapsed_us = 0;
            self.finished = true;
        }
        self.frame_index
    }
}
