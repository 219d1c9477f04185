//! The hierarchical asset table the render loop reads every frame.
//!
//! `AssetTable` maps entity -> animation name -> `FrameSequence`. A
//! `FrameSequence` is immutable and never empty; upgrading an animation means
//! swapping the whole sequence in one write, so a reader either sees the old
//! set or the new one.
//!
//! `SharedAssetTable` is the session-wide handle. The loader holds one clone
//! and writes through it; the render loop holds another and looks slots up at
//! the moment of use.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use image::RgbaImage;
use kaboom_core::{EntityKey, SlotKey};

pub type ImageHandle = Arc<RgbaImage>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameOrigin {
    /// Fetched and decoded from the asset origin.
    Loaded,
    /// Placeholder produced by the synthesizer.
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub image: ImageHandle,
    pub origin: FrameOrigin,
}

impl Frame {
    pub fn loaded(image: ImageHandle) -> Self {
        Self {
            image,
            origin: FrameOrigin::Loaded,
        }
    }

    pub fn synthesized(image: ImageHandle) -> Self {
        Self {
            image,
            origin: FrameOrigin::Synthesized,
        }
    }
}

/// Ordered, non-empty frames of one animation.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Arc<[Frame]>,
}

impl FrameSequence {
    /// Returns `None` for an empty frame list.
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        Some(Self {
            frames: frames.into(),
        })
    }

    pub fn single(frame: Frame) -> Self {
        Self {
            frames: Arc::from(vec![frame]),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Frame at `index`, wrapping around the sequence length.
    pub fn frame_at(&self, index: usize) -> &Frame {
        &self.frames[index % self.frames.len()]
    }

    pub fn loaded_count(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.origin == FrameOrigin::Loaded)
            .count()
    }

    pub fn has_loaded_frames(&self) -> bool {
        self.loaded_count() > 0
    }

    pub fn is_fully_loaded(&self) -> bool {
        self.loaded_count() == self.len()
    }

    /// True when both handles point at the same frame storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frames, &other.frames)
    }
}

pub type EntityAnimationTable = HashMap<String, FrameSequence>;

#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    pub player: EntityAnimationTable,
    pub enemies: HashMap<String, EntityAnimationTable>,
    pub objects: HashMap<String, EntityAnimationTable>,
    pub backgrounds: HashMap<String, EntityAnimationTable>,
}

impl AssetTable {
    pub fn entity(&self, entity: &EntityKey) -> Option<&EntityAnimationTable> {
        match entity {
            EntityKey::Player => Some(&self.player),
            EntityKey::Enemy(name) => self.enemies.get(name),
            EntityKey::Object(name) => self.objects.get(name),
            EntityKey::Background(name) => self.backgrounds.get(name),
        }
    }

    pub fn entity_mut(&mut self, entity: &EntityKey) -> &mut EntityAnimationTable {
        match entity {
            EntityKey::Player => &mut self.player,
            EntityKey::Enemy(name) => self.enemies.entry(name.clone()).or_default(),
            EntityKey::Object(name) => self.objects.entry(name.clone()).or_default(),
            EntityKey::Background(name) => self.backgrounds.entry(name.clone()).or_default(),
        }
    }

    pub fn get(&self, slot: &SlotKey) -> Option<&FrameSequence> {
        self.entity(&slot.entity)
            .and_then(|anims| anims.get(&slot.animation))
    }

    /// Replace one slot's sequence. Returns the previous sequence, if any.
    pub fn insert(&mut self, slot: &SlotKey, sequence: FrameSequence) -> Option<FrameSequence> {
        self.entity_mut(&slot.entity)
            .insert(slot.animation.clone(), sequence)
    }

    pub fn slot_count(&self) -> usize {
        self.player.len()
            + self.enemies.values().map(|a| a.len()).sum::<usize>()
            + self.objects.values().map(|a| a.len()).sum::<usize>()
            + self.backgrounds.values().map(|a| a.len()).sum::<usize>()
    }
}

/// Session-wide handle to the asset table, shared by loader and render loop.
#[derive(Debug, Clone, Default)]
pub struct SharedAssetTable {
    inner: Arc<RwLock<AssetTable>>,
}

impl SharedAssetTable {
    pub fn new(table: AssetTable) -> Self {
        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AssetTable> {
        // A panicked writer leaves whole-sequence swaps intact; keep reading.
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, AssetTable> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, slot: &SlotKey) -> Option<FrameSequence> {
        self.read().get(slot).cloned()
    }

    pub fn player(&self, animation: &str) -> Option<FrameSequence> {
        self.read().player.get(animation).cloned()
    }

    pub fn enemy(&self, enemy: &str, animation: &str) -> Option<FrameSequence> {
        self.read()
            .enemies
            .get(enemy)
            .and_then(|anims| anims.get(animation))
            .cloned()
    }

    pub fn object(&self, object: &str, animation: &str) -> Option<FrameSequence> {
        self.read()
            .objects
            .get(object)
            .and_then(|anims| anims.get(animation))
            .cloned()
    }

    /// Swap one slot's sequence in a single write.
    pub fn replace(&self, slot: &SlotKey, sequence: FrameSequence) -> Option<FrameSequence> {
        self.write().insert(slot, sequence)
    }

    /// Replace the entire table (used once, when the critical phase completes).
    pub fn install(&self, table: AssetTable) {
        *self.write() = table;
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> AssetTable {
        self.read().clone()
    }

    pub fn slot_count(&self) -> usize {
        self.read().slot_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageHandle {
        Arc::new(RgbaImage::new(4, 4))
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert!(FrameSequence::new(Vec::new()).is_none());
    }

    #[test]
    fn counts_loaded_frames() {
        let seq = FrameSequence::new(vec![
            Frame::loaded(image()),
            Frame::synthesized(image()),
            Frame::loaded(image()),
        ])
        .unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.loaded_count(), 2);
        assert!(seq.has_loaded_frames());
        assert!(!seq.is_fully_loaded());
        assert_eq!(seq.frame_at(4).origin, FrameOrigin::Synthesized);
    }

    #[test]
    fn insert_creates_entity_tables() {
        let mut table = AssetTable::default();
        let slot = SlotKey::enemy("Whale", "1-Idle");
        assert!(table.insert(&slot, FrameSequence::single(Frame::loaded(image()))).is_none());
        assert!(table.get(&slot).is_some());
        assert_eq!(table.slot_count(), 1);
    }

    #[test]
    fn readers_observe_whole_sequence_swap() {
        let shared = SharedAssetTable::default();
        let reader = shared.clone();
        let slot = SlotKey::player("1-Idle");

        shared.replace(&slot, FrameSequence::single(Frame::synthesized(image())));
        let before = reader.player("1-Idle").expect("placeholder present");
        assert_eq!(before.len(), 1);

        let upgraded = FrameSequence::new(vec![Frame::loaded(image()); 26]).unwrap();
        let old = shared.replace(&slot, upgraded).expect("had a previous sequence");
        assert!(old.ptr_eq(&before));

        // The reader's held clone is untouched; a fresh lookup sees the upgrade.
        assert_eq!(before.len(), 1);
        let after = reader.player("1-Idle").unwrap();
        assert_eq!(after.len(), 26);
        assert!(after.is_fully_loaded());
    }
}
