//! Turns flat load results into a complete `AssetTable`.
//!
//! Each catalogued slot resolves, in order, to:
//!   1. its own frames, if at least one of them loaded;
//!   2. the first alias candidate of the same entity that loaded directly;
//!   3. a synthesized placeholder.
//!
//! Building does no I/O and is deterministic for the same inputs.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use kaboom_core::{EntityKey, SlotKey};

use crate::catalog::{alias_candidates, Catalog};
use crate::error::SynthesisError;
use crate::synth::{SpriteCategory, Synthesizer};
use crate::table::{AssetTable, EntityAnimationTable, Frame, FrameSequence, ImageHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionTier {
    Direct,
    /// Frames borrowed from the named animation of the same entity.
    Alias(String),
    Synthesized,
}

impl ResolutionTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Alias(_) => "alias",
            Self::Synthesized => "synthesized",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Synthesized => 0,
            Self::Alias(_) => 1,
            Self::Direct => 2,
        }
    }

    /// True if `self` is a better resolution than `other`.
    pub fn improves_on(&self, other: &Self) -> bool {
        self.rank() > other.rank()
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(name) => write!(f, "alias({name})"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotResolution {
    pub slot: SlotKey,
    pub tier: ResolutionTier,
    pub loaded_frames: usize,
    pub total_frames: usize,
}

impl SlotResolution {
    /// Whether installing `self` over `current` would be an upgrade. Between
    /// two aliases the one earlier in the slot's candidate list wins.
    pub fn upgrades(&self, current: &SlotResolution) -> bool {
        if let (ResolutionTier::Alias(new), ResolutionTier::Alias(old)) =
            (&self.tier, &current.tier)
        {
            if new != old {
                return self.alias_rank(new) < self.alias_rank(old);
            }
        } else if self.tier != current.tier {
            return self.tier.improves_on(&current.tier);
        }
        self.loaded_frames > current.loaded_frames
            || (self.loaded_frames == current.loaded_frames
                && self.total_frames > current.total_frames)
    }

    fn alias_rank(&self, animation: &str) -> usize {
        alias_candidates(&self.slot.entity, &self.slot.animation)
            .iter()
            .position(|candidate| *candidate == animation)
            .unwrap_or(usize::MAX)
    }
}

/// Directly loaded sequences, one per slot.
#[derive(Debug, Clone, Default)]
pub struct RawResults {
    slots: HashMap<SlotKey, FrameSequence>,
}

impl RawResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a load for `slot`. An existing entry is only replaced by one
    /// with more loaded frames (ties go to the longer sequence). Returns
    /// whether `sequence` was kept.
    pub fn insert(&mut self, slot: SlotKey, sequence: FrameSequence) -> bool {
        match self.slots.get(&slot) {
            Some(existing)
                if (existing.loaded_count(), existing.len())
                    >= (sequence.loaded_count(), sequence.len()) =>
            {
                false
            }
            _ => {
                self.slots.insert(slot, sequence);
                true
            }
        }
    }

    pub fn get(&self, slot: &SlotKey) -> Option<&FrameSequence> {
        self.slots.get(slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn loaded(&self, slot: &SlotKey) -> Option<&FrameSequence> {
        self.slots.get(slot).filter(|seq| seq.has_loaded_frames())
    }

    fn entities(&self) -> BTreeSet<EntityKey> {
        self.slots.keys().map(|s| s.entity.clone()).collect()
    }

    fn animations_of(&self, entity: &EntityKey) -> BTreeSet<&str> {
        self.slots
            .keys()
            .filter(|s| &s.entity == entity)
            .map(|s| s.animation.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuiltTable {
    pub table: AssetTable,
    pub resolutions: Vec<SlotResolution>,
}

impl BuiltTable {
    pub fn resolution(&self, slot: &SlotKey) -> Option<&SlotResolution> {
        self.resolutions.iter().find(|r| &r.slot == slot)
    }

    pub fn count_tier(&self, label: &str) -> usize {
        self.resolutions
            .iter()
            .filter(|r| r.tier.label() == label)
            .count()
    }
}

/// Placeholder images already drawn during one build.
#[derive(Default)]
struct Placeholders {
    images: HashMap<SpriteCategory, ImageHandle>,
}

impl Placeholders {
    fn for_entity(
        &mut self,
        entity: &EntityKey,
        synth: &Synthesizer,
    ) -> Result<FrameSequence, SynthesisError> {
        let category = SpriteCategory::for_entity(entity);
        let image = match self.images.get(&category) {
            Some(image) => image.clone(),
            None => {
                let image = synth.synthesize(category)?;
                self.images.insert(category, image.clone());
                image
            }
        };
        Ok(FrameSequence::single(Frame::synthesized(image)))
    }
}

pub fn build(
    raw: &RawResults,
    catalog: &Catalog,
    synth: &Synthesizer,
) -> Result<BuiltTable, SynthesisError> {
    let mut entities = catalog.entities();
    for entity in raw.entities() {
        if !entities.contains(&entity) {
            entities.push(entity);
        }
    }

    let mut placeholders = Placeholders::default();
    let mut built = BuiltTable::default();
    for entity in &entities {
        let (anims, resolutions) = resolve_entity(entity, raw, catalog, synth, &mut placeholders)?;
        built.table.entity_mut(entity).extend(anims);
        built.resolutions.extend(resolutions);
    }

    log::info!(
        "Asset table built: {} slot(s), {} direct, {} alias, {} synthesized",
        built.resolutions.len(),
        built.count_tier("direct"),
        built.count_tier("alias"),
        built.count_tier("synthesized")
    );
    Ok(built)
}

/// Rebuild one entity's animations, for incremental upgrades.
pub fn build_entity(
    entity: &EntityKey,
    raw: &RawResults,
    catalog: &Catalog,
    synth: &Synthesizer,
) -> Result<(EntityAnimationTable, Vec<SlotResolution>), SynthesisError> {
    resolve_entity(entity, raw, catalog, synth, &mut Placeholders::default())
}

fn resolve_entity(
    entity: &EntityKey,
    raw: &RawResults,
    catalog: &Catalog,
    synth: &Synthesizer,
    placeholders: &mut Placeholders,
) -> Result<(EntityAnimationTable, Vec<SlotResolution>), SynthesisError> {
    let mut anims = EntityAnimationTable::new();
    let mut resolutions = Vec::new();

    let required = catalog.animations(entity);
    for animation in required {
        let slot = SlotKey::new(entity.clone(), animation);
        let (sequence, tier) = resolve_slot(&slot, raw, synth, placeholders)?;
        log::debug!("{} -> {} ({} frame(s))", slot, tier, sequence.len());
        resolutions.push(SlotResolution {
            slot,
            tier,
            loaded_frames: sequence.loaded_count(),
            total_frames: sequence.len(),
        });
        anims.insert(animation.clone(), sequence);
    }

    // Loaded animations the catalog does not name are kept as-is.
    for animation in raw.animations_of(entity) {
        if required.iter().any(|a| a == animation) {
            continue;
        }
        let slot = SlotKey::new(entity.clone(), animation);
        if let Some(sequence) = raw.get(&slot) {
            let tier = if sequence.has_loaded_frames() {
                ResolutionTier::Direct
            } else {
                ResolutionTier::Synthesized
            };
            resolutions.push(SlotResolution {
                slot,
                tier,
                loaded_frames: sequence.loaded_count(),
                total_frames: sequence.len(),
            });
            anims.insert(animation.to_string(), sequence.clone());
        }
    }

    Ok((anims, resolutions))
}

fn resolve_slot(
    slot: &SlotKey,
    raw: &RawResults,
    synth: &Synthesizer,
    placeholders: &mut Placeholders,
) -> Result<(FrameSequence, ResolutionTier), SynthesisError> {
    if let Some(sequence) = raw.loaded(slot) {
        return Ok((sequence.clone(), ResolutionTier::Direct));
    }
    for candidate in alias_candidates(&slot.entity, &slot.animation) {
        let alias = SlotKey::new(slot.entity.clone(), candidate);
        if let Some(sequence) = raw.loaded(&alias) {
            return Ok((sequence.clone(), ResolutionTier::Alias(candidate.to_string())));
        }
    }
    Ok((
        placeholders.for_entity(&slot.entity, synth)?,
        ResolutionTier::Synthesized,
    ))
}
