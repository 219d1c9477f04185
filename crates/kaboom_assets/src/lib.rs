pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod fetch;
pub mod loader;
pub mod scheduler;
pub mod source;
pub mod synth;
pub mod table;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{build, build_entity, BuiltTable, RawResults, ResolutionTier, SlotResolution};
pub use catalog::Catalog;
pub use config::{load_config_from_path, LoaderConfig};
pub use error::{FetchError, LoadError, SynthesisError};
pub use events::{EventJournal, LoadEvent, LoadPhase};
pub use fetch::{FetchPolicy, FetchStats, Fetcher};
pub use loader::Loader;
pub use scheduler::{
    load_batch, load_frames, LoadOutcome, LoadRequest, NoProgress, ProgressCounter,
    ProgressObserver, RequestId,
};
pub use source::{AssetSource, DirSource, HttpSource};
pub use synth::{SpriteCategory, Synthesizer};
pub use table::{AssetTable, Frame, FrameOrigin, FrameSequence, ImageHandle, SharedAssetTable};
