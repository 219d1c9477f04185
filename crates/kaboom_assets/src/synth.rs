//! Procedural placeholder sprites.
//!
//! Every category gets a solid, distinct body colour plus a simple mark so a
//! placeholder is recognisable on screen (eyes for characters, a fuse for the
//! bomb, a grid for tiles). Output is fully deterministic: the same category
//! and size always produce identical pixels. Drawing is done in a 64x64 design
//! space and scaled to the configured sprite size.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use kaboom_core::EntityKey;

use crate::error::SynthesisError;
use crate::table::ImageHandle;

pub const DEFAULT_SPRITE_SIZE: u32 = 64;
pub const MAX_SPRITE_SIZE: u32 = 512;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteCategory {
    Player,
    Enemy,
    Bomb,
    Tile,
    Door,
    Generic,
}

impl SpriteCategory {
    pub const ALL: &'static [SpriteCategory] = &[
        SpriteCategory::Player,
        SpriteCategory::Enemy,
        SpriteCategory::Bomb,
        SpriteCategory::Tile,
        SpriteCategory::Door,
        SpriteCategory::Generic,
    ];

    /// Pick the placeholder style for an asset-table entity.
    pub fn for_entity(entity: &EntityKey) -> Self {
        match entity {
            EntityKey::Player => Self::Player,
            EntityKey::Enemy(_) => Self::Enemy,
            EntityKey::Object(name) => {
                let name = name.to_ascii_lowercase();
                if name.contains("bomb") {
                    Self::Bomb
                } else if name.contains("door") {
                    Self::Door
                } else if name.contains("tile") {
                    Self::Tile
                } else {
                    Self::Generic
                }
            }
            EntityKey::Background(_) => Self::Generic,
        }
    }

    pub fn body_color(self) -> Rgba<u8> {
        match self {
            Self::Player => Rgba([0x22, 0x8B, 0x22, 0xFF]),
            Self::Enemy => Rgba([0xDC, 0x14, 0x3C, 0xFF]),
            Self::Bomb => Rgba([0x2F, 0x2F, 0x2F, 0xFF]),
            Self::Tile => Rgba([0x8B, 0x45, 0x13, 0xFF]),
            Self::Door => Rgba([0x6B, 0x3A, 0x1E, 0xFF]),
            Self::Generic => Rgba([0x88, 0x88, 0x88, 0xFF]),
        }
    }
}

/// Placeholder sprite generator for one session.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    size: u32,
}

impl Synthesizer {
    pub fn new(size: u32) -> Result<Self, SynthesisError> {
        if size == 0 || size > MAX_SPRITE_SIZE {
            return Err(SynthesisError::InvalidSize(size));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn synthesize(&self, category: SpriteCategory) -> Result<ImageHandle, SynthesisError> {
        let mut canvas = Canvas::new(self.size)?;
        match category {
            SpriteCategory::Player => {
                canvas.disc(32.0, 32.0, 28.0, category.body_color());
                canvas.face(WHITE, BLACK);
                // Hat
                canvas.rect(16.0, 12.0, 32.0, 8.0, Rgba([0x8B, 0x45, 0x13, 0xFF]));
            }
            SpriteCategory::Enemy => {
                canvas.disc(32.0, 32.0, 28.0, category.body_color());
                canvas.face(WHITE, Rgba([0xFF, 0x00, 0x00, 0xFF]));
            }
            SpriteCategory::Bomb => {
                canvas.disc(32.0, 40.0, 20.0, category.body_color());
                canvas.line(32.0, 20.0, 28.0, 8.0, 3.0, Rgba([0x8B, 0x45, 0x13, 0xFF]));
                canvas.disc(28.0, 8.0, 3.0, Rgba([0xFF, 0x45, 0x00, 0xFF]));
            }
            SpriteCategory::Tile => {
                canvas.rect(0.0, 0.0, 64.0, 64.0, category.body_color());
                canvas.outline(2.0, Rgba([0x65, 0x43, 0x21, 0xFF]));
                canvas.rect(0.0, 31.5, 64.0, 1.0, Rgba([0xA0, 0x52, 0x2D, 0xFF]));
                canvas.rect(31.5, 0.0, 1.0, 64.0, Rgba([0xA0, 0x52, 0x2D, 0xFF]));
            }
            SpriteCategory::Door => {
                canvas.rect(14.0, 4.0, 36.0, 60.0, category.body_color());
                canvas.rect(18.0, 8.0, 28.0, 52.0, Rgba([0x8B, 0x5A, 0x2B, 0xFF]));
                canvas.disc(40.0, 36.0, 3.0, Rgba([0xDA, 0xA5, 0x20, 0xFF]));
            }
            SpriteCategory::Generic => {
                canvas.rect(0.0, 0.0, 64.0, 64.0, category.body_color());
                canvas.question_mark(WHITE);
            }
        }
        Ok(Arc::new(canvas.image))
    }
}

/// Raster with drawing primitives expressed in 64x64 design units.
struct Canvas {
    image: RgbaImage,
    scale: f32,
}

impl Canvas {
    fn new(size: u32) -> Result<Self, SynthesisError> {
        let raster = SynthesisError::Raster {
            width: size,
            height: size,
        };
        let len = (size as usize)
            .checked_mul(size as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| raster.clone())?;
        // Zeroed RGBA is fully transparent.
        let image = RgbaImage::from_raw(size, size, vec![0; len]).ok_or(raster)?;
        Ok(Self {
            image,
            scale: size as f32 / DEFAULT_SPRITE_SIZE as f32,
        })
    }

    fn fill_where(&mut self, color: Rgba<u8>, inside: impl Fn(f32, f32) -> bool) {
        let scale = self.scale;
        for (x, y, pixel) in self.image.enumerate_pixels_mut() {
            // Sample at the pixel centre, in design units.
            let dx = (x as f32 + 0.5) / scale;
            let dy = (y as f32 + 0.5) / scale;
            if inside(dx, dy) {
                *pixel = color;
            }
        }
    }

    fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba<u8>) {
        self.fill_where(color, |px, py| px >= x && px < x + w && py >= y && py < y + h);
    }

    fn outline(&mut self, width: f32, color: Rgba<u8>) {
        self.fill_where(color, |px, py| {
            px < width || py < width || px >= 64.0 - width || py >= 64.0 - width
        });
    }

    fn disc(&mut self, cx: f32, cy: f32, r: f32, color: Rgba<u8>) {
        self.fill_where(color, |px, py| {
            let (dx, dy) = (px - cx, py - cy);
            dx * dx + dy * dy <= r * r
        });
    }

    fn line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, width: f32, color: Rgba<u8>) {
        let (vx, vy) = (x1 - x0, y1 - y0);
        let len_sq = (vx * vx + vy * vy).max(f32::EPSILON);
        let half = width / 2.0;
        self.fill_where(color, |px, py| {
            let t = (((px - x0) * vx + (py - y0) * vy) / len_sq).clamp(0.0, 1.0);
            let (cx, cy) = (x0 + t * vx, y0 + t * vy);
            let (dx, dy) = (px - cx, py - cy);
            dx * dx + dy * dy <= half * half
        });
    }

    fn face(&mut self, eye: Rgba<u8>, pupil: Rgba<u8>) {
        self.rect(24.0, 24.0, 6.0, 6.0, eye);
        self.rect(34.0, 24.0, 6.0, 6.0, eye);
        self.rect(26.0, 26.0, 2.0, 2.0, pupil);
        self.rect(36.0, 26.0, 2.0, 2.0, pupil);
    }

    fn question_mark(&mut self, color: Rgba<u8>) {
        self.rect(26.0, 18.0, 12.0, 4.0, color);
        self.rect(36.0, 18.0, 4.0, 12.0, color);
        self.rect(30.0, 28.0, 8.0, 4.0, color);
        self.rect(30.0, 30.0, 4.0, 8.0, color);
        self.rect(30.0, 42.0, 4.0, 4.0, color);
    }
}
