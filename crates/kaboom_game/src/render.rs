//! Headless stand-in for the canvas renderer.
//!
//! Each tick looks every sprite's slot up in the shared table at the moment
//! of use, advances its cursor and "draws" the selected frame by counting it.
//! Looking the slot up every tick is what lets background upgrades show up
//! without the renderer being told.

use kaboom_assets::{FrameOrigin, SharedAssetTable};
use kaboom_core::{AnimationCursor, SlotKey};

pub const FIXED_DT_US: u64 = 16_667;
const FRAME_DURATION_US: u64 = 100_000;

struct SpriteInstance {
    slot: SlotKey,
    cursor: AnimationCursor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub drawn: usize,
    pub placeholders: usize,
    /// Slots the table could not answer. Always zero once the table is built.
    pub missing: usize,
}

pub struct HeadlessRenderer {
    table: SharedAssetTable,
    sprites: Vec<SpriteInstance>,
}

impl HeadlessRenderer {
    pub fn new(table: SharedAssetTable) -> Self {
        Self {
            table,
            sprites: Vec::new(),
        }
    }

    pub fn spawn(&mut self, slot: SlotKey, looping: bool) {
        self.sprites.push(SpriteInstance {
            slot,
            cursor: AnimationCursor::new(FRAME_DURATION_US, looping),
        });
    }

    /// The scene the boot binary plays while assets stream in.
    pub fn demo_scene(table: SharedAssetTable) -> Self {
        let mut renderer = Self::new(table);
        renderer.spawn(SlotKey::player("1-Idle"), true);
        renderer.spawn(SlotKey::player("2-Run"), true);
        renderer.spawn(SlotKey::player("5-Fall"), true);
        for enemy in ["Bald Pirate", "Cucumber", "Big Guy", "Captain", "Whale"] {
            renderer.spawn(SlotKey::enemy(enemy, "1-Idle"), true);
        }
        renderer.spawn(SlotKey::object("1-BOMB", "2-Bomb On"), true);
        renderer.spawn(SlotKey::object("1-BOMB", "3-Explotion"), false);
        renderer.spawn(SlotKey::object("2-Door", "1-Closed"), true);
        renderer.spawn(SlotKey::object("tiles", "blocks"), true);
        renderer
    }

    pub fn tick(&mut self, dt_us: u64) -> FrameReport {
        let mut report = FrameReport::default();
        for sprite in &mut self.sprites {
            let Some(sequence) = self.table.get(&sprite.slot) else {
                report.missing += 1;
                continue;
            };
            let index = sprite.cursor.tick(dt_us, sequence.len());
            let frame = sequence.frame_at(index);
            if frame.origin == FrameOrigin::Synthesized {
                report.placeholders += 1;
            }
            report.drawn += 1;
            log::trace!(
                "{} frame {}/{} ({}x{})",
                sprite.slot,
                index + 1,
                sequence.len(),
                frame.image.width(),
                frame.image.height()
            );
        }
        report
    }
}
