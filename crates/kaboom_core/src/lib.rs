pub mod animation;
pub mod manifest;
pub mod path;
pub mod priority;

pub use animation::{AnimationCursor, AnimationSpec, EntityKey, SlotKey};
pub use manifest::{AssetManifest, AssetSpec, ManifestEntry};
pub use path::AssetPath;
pub use priority::LoadPriority;
