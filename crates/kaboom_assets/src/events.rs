//! Structured record of what the loader did, mirrored to the log.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use kaboom_core::{AssetPath, SlotKey};

use crate::builder::{ResolutionTier, SlotResolution};
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    LoadingCritical,
    Playable,
    LoadingBackground,
    Complete,
}

impl fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LoadingCritical => "loading-critical",
            Self::Playable => "playable",
            Self::LoadingBackground => "loading-background",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    PhaseChanged { from: LoadPhase, to: LoadPhase },
    FetchFailed { path: AssetPath, error: FetchError },
    FrameBackfilled { slot: SlotKey, index: u32 },
    SlotResolved(SlotResolution),
    SlotUpgraded {
        slot: SlotKey,
        from: ResolutionTier,
        to: ResolutionTier,
    },
    CriticalDeadlineHit { completed: usize, total: usize },
}

/// Shared append-only event list.
#[derive(Debug, Clone, Default)]
pub struct EventJournal {
    events: Arc<Mutex<Vec<LoadEvent>>>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LoadEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, event: LoadEvent) {
        match &event {
            LoadEvent::PhaseChanged { from, to } => log::info!("Loader phase {from} -> {to}"),
            LoadEvent::FetchFailed { path, error } => {
                log::warn!("Fetch failed for {path} ({}): {error}", error.kind())
            }
            LoadEvent::FrameBackfilled { slot, index } => {
                log::debug!("{slot}: frame {} replaced by placeholder", index + 1)
            }
            LoadEvent::SlotResolved(res) => {
                if res.tier == ResolutionTier::Synthesized {
                    log::warn!("{} has no frames, using placeholder", res.slot);
                } else {
                    log::debug!("{} resolved as {}", res.slot, res.tier);
                }
            }
            LoadEvent::SlotUpgraded { slot, from, to } => {
                log::debug!("{slot} upgraded {from} -> {to}")
            }
            LoadEvent::CriticalDeadlineHit { completed, total } => log::warn!(
                "Critical deadline hit with {completed}/{total} assets settled; filling gaps with placeholders"
            ),
        }
        self.lock().push(event);
    }

    pub fn snapshot(&self) -> Vec<LoadEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Latest recorded resolution for `slot`.
    pub fn resolution_of(&self, slot: &SlotKey) -> Option<ResolutionTier> {
        self.lock().iter().rev().find_map(|event| match event {
            LoadEvent::SlotResolved(res) if &res.slot == slot => Some(res.tier.clone()),
            LoadEvent::SlotUpgraded { slot: s, to, .. } if s == slot => Some(to.clone()),
            _ => None,
        })
    }

    pub fn phases(&self) -> Vec<LoadPhase> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                LoadEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_resolution_wins() {
        let journal = EventJournal::new();
        let slot = SlotKey::player("5-Fall");
        journal.record(LoadEvent::SlotResolved(SlotResolution {
            slot: slot.clone(),
            tier: ResolutionTier::Synthesized,
            loaded_frames: 0,
            total_frames: 1,
        }));
        assert_eq!(journal.resolution_of(&slot), Some(ResolutionTier::Synthesized));

        journal.record(LoadEvent::SlotUpgraded {
            slot: slot.clone(),
            from: ResolutionTier::Synthesized,
            to: ResolutionTier::Direct,
        });
        assert_eq!(journal.resolution_of(&slot), Some(ResolutionTier::Direct));
        assert_eq!(journal.resolution_of(&SlotKey::player("1-Idle")), None);
    }

    #[test]
    fn clones_share_storage() {
        let journal = EventJournal::new();
        let other = journal.clone();
        other.record(LoadEvent::PhaseChanged {
            from: LoadPhase::Idle,
            to: LoadPhase::LoadingCritical,
        });
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.phases(), vec![LoadPhase::LoadingCritical]);
    }
}
