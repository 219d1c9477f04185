//! Two-phase loading orchestrator.
//!
//! `load_critical` fetches the first frame(s) of every critical animation
//! under a hard deadline, builds a complete table (aliases and placeholders
//! fill the gaps) and hands it to the caller. The background pass then loads
//! every manifest animation at full length and swaps upgraded slots into the
//! same shared table, one whole `FrameSequence` at a time.
//!
//! Asset failures never reach the caller. Only a synthesis failure does,
//! because without placeholders the table cannot be made complete.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use kaboom_core::manifest::validate_manifest;
use kaboom_core::{AssetManifest, AssetSpec, LoadPriority, ManifestEntry, SlotKey};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::builder::{build, build_entity, RawResults, ResolutionTier, SlotResolution};
use crate::catalog::Catalog;
use crate::config::{validate_config, LoaderConfig};
use crate::error::{LoadError, SynthesisError};
use crate::events::{EventJournal, LoadEvent};
use crate::fetch::{FetchStats, Fetcher};
use crate::scheduler::{
    assemble_frames, load_batch_into, load_tiered, LoadOutcome, LoadRequest, ProgressCounter,
    ProgressObserver,
};
use crate::source::AssetSource;
use crate::synth::Synthesizer;
use crate::table::SharedAssetTable;

pub use crate::events::LoadPhase;

#[derive(Default)]
struct LoaderState {
    raw: RawResults,
    resolutions: HashMap<SlotKey, SlotResolution>,
}

/// Owns the fetch cache and the asset table for one game session.
pub struct Loader {
    config: LoaderConfig,
    manifest: AssetManifest,
    catalog: Catalog,
    fetcher: Fetcher,
    synth: Synthesizer,
    table: SharedAssetTable,
    journal: EventJournal,
    session_id: Uuid,
    phase: watch::Sender<LoadPhase>,
    state: Mutex<LoaderState>,
    background_started: AtomicBool,
    background_error: Mutex<Option<LoadError>>,
}

/// Held by the background task. Marks the session `Complete` however the task
/// ends, recording an abort if it unwound or was cancelled first.
struct BackgroundGuard {
    loader: Arc<Loader>,
    finished: bool,
}

impl BackgroundGuard {
    fn finish(mut self, result: Result<(), SynthesisError>) {
        if let Err(err) = result {
            log::error!("Background load aborted: {err}");
            self.loader.set_background_error(LoadError::Synthesis(err));
        }
        self.finished = true;
    }
}

impl Drop for BackgroundGuard {
    fn drop(&mut self) {
        if !self.finished {
            log::error!("Background load task ended without finishing");
            self.loader.set_background_error(LoadError::BackgroundAborted);
        }
        self.loader.set_phase(LoadPhase::Complete);
    }
}

impl Loader {
    pub fn new(
        config: LoaderConfig,
        manifest: AssetManifest,
        source: Arc<dyn AssetSource>,
    ) -> Result<Arc<Self>, LoadError> {
        Self::with_catalog(config, manifest, Catalog::pirate_bomb(), source)
    }

    pub fn with_catalog(
        config: LoaderConfig,
        manifest: AssetManifest,
        catalog: Catalog,
        source: Arc<dyn AssetSource>,
    ) -> Result<Arc<Self>, LoadError> {
        let synth = Synthesizer::new(config.sprite_size)?;
        validate_config(&config).map_err(LoadError::Config)?;
        validate_manifest(&manifest).map_err(LoadError::Config)?;
        let origin = config.origin().map_err(LoadError::Config)?;

        let session_id = Uuid::new_v4();
        log::info!(
            "Asset session {} using {} at {} ({} critical, {} lazy entries)",
            session_id,
            source.describe(),
            origin,
            manifest.critical.len(),
            manifest.lazy.len()
        );

        let (phase, _) = watch::channel(LoadPhase::Idle);
        Ok(Arc::new(Self {
            fetcher: Fetcher::new(source, origin, config.fetch_policy()),
            config,
            manifest,
            catalog,
            synth,
            table: SharedAssetTable::default(),
            journal: EventJournal::new(),
            session_id,
            phase,
            state: Mutex::new(LoaderState::default()),
            background_started: AtomicBool::new(false),
            background_error: Mutex::new(None),
        }))
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Handle to the session's table. Clones observe every later upgrade.
    pub fn table(&self) -> SharedAssetTable {
        self.table.clone()
    }

    pub fn phase(&self) -> LoadPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<LoadPhase> {
        self.phase.subscribe()
    }

    pub fn events(&self) -> &EventJournal {
        &self.journal
    }

    pub fn fetch_stats(&self) -> FetchStats {
        self.fetcher.stats()
    }

    fn set_phase(&self, to: LoadPhase) {
        let from = self.phase.send_replace(to);
        if from != to {
            self.journal.record(LoadEvent::PhaseChanged { from, to });
        }
    }

    fn set_background_error(&self, err: LoadError) {
        *self
            .background_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(err);
    }

    fn lock_state(&self) -> MutexGuard<'_, LoaderState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load enough to render the first frame and return the table.
    ///
    /// Completes within `critical_deadline` whatever the network does. Only
    /// the first call loads; later or concurrent calls wait for that load and
    /// return the same table.
    pub async fn load_critical(
        self: &Arc<Self>,
        progress: &dyn ProgressObserver,
    ) -> Result<SharedAssetTable, LoadError> {
        let claimed = self.phase.send_if_modified(|phase| {
            if *phase == LoadPhase::Idle {
                *phase = LoadPhase::LoadingCritical;
                true
            } else {
                false
            }
        });
        if !claimed {
            log::debug!("Critical load already claimed for session {}", self.session_id);
            let mut phase = self.phase.subscribe();
            // The sender lives as long as `self`, so this only fails if it is gone.
            let _ = phase
                .wait_for(|p| *p != LoadPhase::Idle && *p != LoadPhase::LoadingCritical)
                .await;
            return Ok(self.table());
        }
        self.journal.record(LoadEvent::PhaseChanged {
            from: LoadPhase::Idle,
            to: LoadPhase::LoadingCritical,
        });

        let limit = self.config.critical_frame_limit;
        let mut expected = Vec::with_capacity(self.manifest.critical.len());
        let mut requests = Vec::new();
        for entry in &self.manifest.critical {
            let spec = entry.spec.truncated(limit);
            expected.push((entry.slot.clone(), spec.frame_count()));
            requests.extend(LoadRequest::for_spec(&entry.slot, &spec, LoadPriority::Critical));
        }

        let counter = ProgressCounter::new(progress, requests.len());
        let mut outcomes = Vec::with_capacity(requests.len());
        let deadline = self.config.critical_deadline();
        let settled = tokio::time::timeout(
            deadline,
            load_tiered(
                &self.fetcher,
                requests,
                &self.config.batch_sizes,
                self.config.batch_pause(),
                &counter,
                &mut outcomes,
            ),
        )
        .await;
        if settled.is_err() {
            self.journal.record(LoadEvent::CriticalDeadlineHit {
                completed: outcomes.len(),
                total: counter.total(),
            });
        }
        counter.finish();
        self.record_failures(&outcomes);

        let built = {
            let mut state = self.lock_state();
            for (slot, frame_count) in &expected {
                self.absorb(&mut state, slot, *frame_count, &outcomes)?;
            }
            build(&state.raw, &self.catalog, &self.synth)?
        };

        self.table.install(built.table);
        {
            let mut state = self.lock_state();
            for resolution in built.resolutions {
                state
                    .resolutions
                    .insert(resolution.slot.clone(), resolution.clone());
                self.journal.record(LoadEvent::SlotResolved(resolution));
            }
        }
        self.set_phase(LoadPhase::Playable);

        if self.config.auto_background {
            self.start_background_load();
        }
        Ok(self.table())
    }

    /// Spawn the background pass. Returns `None` if it is already running or
    /// done, or if the critical phase has not finished yet.
    pub fn start_background_load(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.phase() == LoadPhase::Idle || self.phase() == LoadPhase::LoadingCritical {
            log::debug!("Background load requested before the game is playable");
            return None;
        }
        if self.background_started.swap(true, Ordering::AcqRel) {
            log::debug!("Background load already started");
            return None;
        }

        let guard = BackgroundGuard {
            loader: Arc::clone(self),
            finished: false,
        };
        Some(tokio::spawn(async move {
            let result = guard.loader.run_background().await;
            guard.finish(result);
        }))
    }

    /// Wait for the background pass to finish. Returns at once if it was
    /// never started.
    pub async fn wait_background(&self) -> Result<(), LoadError> {
        if !self.background_started.load(Ordering::Acquire) {
            return Ok(());
        }
        let mut phase = self.phase.subscribe();
        // The sender lives as long as `self`, so this only fails if it is gone.
        let _ = phase.wait_for(|p| *p == LoadPhase::Complete).await;

        let error = self
            .background_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        match error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn run_background(&self) -> Result<(), SynthesisError> {
        self.set_phase(LoadPhase::LoadingBackground);

        let mut tiers: BTreeMap<LoadPriority, Vec<&ManifestEntry>> = BTreeMap::new();
        for entry in &self.manifest.critical {
            tiers.entry(LoadPriority::High).or_default().push(entry);
        }
        for entry in &self.manifest.lazy {
            tiers.entry(lazy_priority(entry)).or_default().push(entry);
        }

        let report = |completed: usize, total: usize| {
            log::debug!("Background load {completed}/{total}");
        };
        let counter = ProgressCounter::new(&report, self.manifest.total_frames() as usize);
        let pause = self.config.batch_pause();

        for (priority, entries) in tiers {
            log::info!("Background tier {}: {} animation(s)", priority, entries.len());
            for entry in entries {
                let requests = LoadRequest::for_spec(&entry.slot, &entry.spec, priority);
                let mut outcomes = Vec::with_capacity(requests.len());
                load_batch_into(
                    &self.fetcher,
                    &requests,
                    self.config.batch_sizes.for_priority(priority),
                    pause,
                    &counter,
                    &mut outcomes,
                )
                .await;
                self.record_failures(&outcomes);
                self.upgrade(&entry.slot, entry.spec.frame_count(), &outcomes)?;
                tokio::task::yield_now().await;
            }
        }
        counter.finish();

        let stats = self.fetcher.stats();
        log::info!(
            "Background load finished: {} image(s) cached, {} request(s) issued",
            stats.cached,
            stats.source_requests
        );
        Ok(())
    }

    fn record_failures(&self, outcomes: &[LoadOutcome]) {
        for outcome in outcomes {
            if let Err(error) = &outcome.result {
                self.journal.record(LoadEvent::FetchFailed {
                    path: outcome.path.clone(),
                    error: error.clone(),
                });
            }
        }
    }

    /// Assemble one slot's outcomes into the raw results. Returns whether the
    /// new sequence replaced what was there.
    fn absorb(
        &self,
        state: &mut LoaderState,
        slot: &SlotKey,
        frame_count: u32,
        outcomes: &[LoadOutcome],
    ) -> Result<bool, SynthesisError> {
        let (sequence, backfilled) = assemble_frames(slot, frame_count, outcomes, &self.synth)?;
        for index in backfilled {
            self.journal.record(LoadEvent::FrameBackfilled {
                slot: slot.clone(),
                index,
            });
        }
        Ok(state.raw.insert(slot.clone(), sequence))
    }

    /// Fold a full load of `slot` into the table, swapping in every slot of
    /// the same entity whose resolution improved.
    fn upgrade(
        &self,
        slot: &SlotKey,
        frame_count: u32,
        outcomes: &[LoadOutcome],
    ) -> Result<(), SynthesisError> {
        let mut state = self.lock_state();
        if !self.absorb(&mut state, slot, frame_count, outcomes)? {
            return Ok(());
        }
        let (anims, resolutions) =
            build_entity(&slot.entity, &state.raw, &self.catalog, &self.synth)?;

        for resolution in resolutions {
            let improved = match state.resolutions.get(&resolution.slot) {
                Some(current) => resolution.upgrades(current).then(|| current.tier.clone()),
                None => Some(ResolutionTier::Synthesized),
            };
            let Some(from) = improved else {
                continue;
            };
            let Some(sequence) = anims.get(&resolution.slot.animation) else {
                continue;
            };
            self.table.replace(&resolution.slot, sequence.clone());
            self.journal.record(LoadEvent::SlotUpgraded {
                slot: resolution.slot.clone(),
                from,
                to: resolution.tier.clone(),
            });
            state
                .resolutions
                .insert(resolution.slot.clone(), resolution);
        }
        Ok(())
    }
}

/// Background priority for a lazy entry without an explicit one: frame
/// sequences at Medium, standalone images at Low.
fn lazy_priority(entry: &ManifestEntry) -> LoadPriority {
    entry.priority.unwrap_or(match entry.spec {
        AssetSpec::Frames(_) => LoadPriority::Medium,
        AssetSpec::Single(_) => LoadPriority::Low,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::FrameOrigin;
    use crate::testing::{Behavior, MockSource};
    use kaboom_core::{AnimationSpec, AssetPath};
    use std::time::Duration;

    fn config(auto_background: bool) -> LoaderConfig {
        LoaderConfig {
            auto_background,
            ..LoaderConfig::default()
        }
    }

    fn loader(source: Arc<MockSource>, auto_background: bool) -> Arc<Loader> {
        Loader::new(config(auto_background), AssetManifest::pirate_bomb(), source).unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<(usize, usize)>>>, impl Fn(usize, usize) + Send + Sync) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        (calls, move |c, t| sink.lock().unwrap().push((c, t)))
    }

    #[tokio::test(start_paused = true)]
    async fn critical_phase_loads_first_frames() {
        let source = Arc::new(MockSource::new());
        let loader = loader(source.clone(), false);
        let (calls, observer) = recorder();

        let table = loader.load_critical(&observer).await.unwrap();
        assert_eq!(loader.phase(), LoadPhase::Playable);

        // One frame per critical entry.
        let critical = AssetManifest::pirate_bomb().critical.len();
        assert_eq!(source.total_requests(), critical);

        let idle = table.player("1-Idle").unwrap();
        assert_eq!(idle.len(), 1);
        assert!(idle.is_fully_loaded());

        let calls = calls.lock().unwrap().clone();
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(calls.last(), Some(&(critical, critical)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_critical_phase_when_everything_hangs() {
        let source = Arc::new(MockSource::with_default(Behavior::Hang));
        let loader = loader(source.clone(), false);
        let (calls, observer) = recorder();

        let started = tokio::time::Instant::now();
        let table = loader.load_critical(&observer).await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(8000));
        assert!(elapsed < Duration::from_millis(9000), "{elapsed:?}");

        for slot in Catalog::pirate_bomb().required_slots() {
            let seq = table.get(&slot).unwrap_or_else(|| panic!("{slot} missing"));
            assert_eq!(seq.frame_at(0).origin, FrameOrigin::Synthesized);
        }
        assert!(loader
            .events()
            .snapshot()
            .iter()
            .any(|e| matches!(e, LoadEvent::CriticalDeadlineHit { completed: 0, .. })));
        let total = AssetManifest::pirate_bomb().critical.len();
        assert_eq!(calls.lock().unwrap().last(), Some(&(total, total)));
        assert_eq!(loader.phase(), LoadPhase::Playable);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_critical_fetches_fall_back_to_aliases() {
        let source = Arc::new(MockSource::new());
        source.set("1-Player-Bomb Guy/5-Fall", Behavior::Fail);
        let loader = loader(source.clone(), false);

        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        let fall = SlotKey::player("5-Fall");
        assert_eq!(
            loader.events().resolution_of(&fall),
            Some(ResolutionTier::Alias("4-Jump".into()))
        );
        assert!(loader
            .events()
            .snapshot()
            .iter()
            .any(|e| matches!(e, LoadEvent::FetchFailed { path, .. } if path.as_str().contains("5-Fall"))));
    }

    #[tokio::test(start_paused = true)]
    async fn whale_is_synthesized_for_every_animation() {
        let source = Arc::new(MockSource::new());
        let loader = loader(source.clone(), true);
        let table = loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        loader.wait_background().await.unwrap();

        for anim in crate::catalog::ENEMY_ANIMATIONS {
            let slot = SlotKey::enemy("Whale", anim);
            assert_eq!(
                loader.events().resolution_of(&slot),
                Some(ResolutionTier::Synthesized),
                "{slot}"
            );
            assert!(table.get(&slot).is_some());
        }
        assert_eq!(source.requests_for("Whale"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn background_pass_upgrades_slots_in_place() {
        let source = Arc::new(MockSource::new());
        let loader = loader(source.clone(), false);
        let table = loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        let reader = table.clone();
        assert_eq!(reader.player("1-Idle").unwrap().len(), 1);
        assert_eq!(
            loader.events().resolution_of(&SlotKey::player("7-Hit")),
            Some(ResolutionTier::Alias("1-Idle".into()))
        );

        let handle = loader.start_background_load().expect("first start");
        handle.await.unwrap();
        assert_eq!(loader.phase(), LoadPhase::Complete);

        let idle = reader.player("1-Idle").unwrap();
        assert_eq!(idle.len(), 26);
        assert!(idle.is_fully_loaded());
        assert_eq!(reader.enemy("Cucumber", "1-Idle").unwrap().len(), 36);
        assert_eq!(
            loader.events().resolution_of(&SlotKey::player("7-Hit")),
            Some(ResolutionTier::Direct)
        );
        assert!(loader.events().snapshot().iter().any(|e| matches!(
            e,
            LoadEvent::SlotUpgraded { slot, .. } if *slot == SlotKey::player("1-Idle")
        )));
        assert_eq!(
            loader.events().phases(),
            vec![
                LoadPhase::LoadingCritical,
                LoadPhase::Playable,
                LoadPhase::LoadingBackground,
                LoadPhase::Complete
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn background_start_is_guarded_and_fetches_each_path_once() {
        let source = Arc::new(MockSource::new());
        let loader = loader(source.clone(), false);
        assert!(loader.start_background_load().is_none(), "not playable yet");

        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        let first = loader.start_background_load();
        let second = loader.start_background_load();
        assert!(first.is_some());
        assert!(second.is_none());

        first.unwrap().await.unwrap();
        loader.wait_background().await.unwrap();
        assert_eq!(source.max_requests_per_url(), 1);
        assert_eq!(
            source.total_requests() as u32,
            AssetManifest::pirate_bomb().total_frames()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn partial_background_load_keeps_loaded_frames() {
        let source = Arc::new(MockSource::new());
        // Critical first frame loads, then every other Run frame fails.
        source.set("1-Player-Bomb Guy/2-Run/", Behavior::Fail);
        source.set("1-Player-Bomb Guy/2-Run/1.png", Behavior::Ok);
        let loader = loader(source.clone(), false);
        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();

        loader.start_background_load().unwrap().await.unwrap();
        let run = loader.table().player("2-Run").unwrap();
        assert_eq!(run.len(), 14);
        assert_eq!(run.loaded_count(), 1);
        assert_eq!(run.frame_at(0).origin, FrameOrigin::Loaded);
        assert_eq!(run.frame_at(1).origin, FrameOrigin::Synthesized);
    }

    #[tokio::test(start_paused = true)]
    async fn second_critical_call_reuses_table() {
        let source = Arc::new(MockSource::new());
        let loader = loader(source.clone(), false);
        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        let before = source.total_requests();
        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        assert_eq!(source.total_requests(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_critical_callers_both_get_a_complete_table() {
        let source = Arc::new(MockSource::with_default(Behavior::Delay(
            Duration::from_millis(50),
        )));
        let loader = loader(source.clone(), false);

        let first = loader.load_critical(&crate::scheduler::NoProgress);
        let second = async {
            tokio::task::yield_now().await;
            loader.load_critical(&crate::scheduler::NoProgress).await
        };
        let (first, second) = tokio::join!(first, second);
        let (first, second) = (first.unwrap(), second.unwrap());

        for slot in Catalog::pirate_bomb().required_slots() {
            assert!(second.get(&slot).is_some(), "{slot} missing");
        }
        assert!(first.player("1-Idle").unwrap().is_fully_loaded());
        assert_eq!(
            source.total_requests(),
            AssetManifest::pirate_bomb().critical.len()
        );
        assert_eq!(
            loader.events().phases(),
            vec![LoadPhase::LoadingCritical, LoadPhase::Playable]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn background_settles_on_the_preferred_alias() {
        let source = Arc::new(MockSource::new());
        source.set("1-Player-Bomb Guy/8-Dead Hit", Behavior::Fail);
        let loader = loader(source.clone(), false);
        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        let dead_hit = SlotKey::player("8-Dead Hit");
        assert_eq!(
            loader.events().resolution_of(&dead_hit),
            Some(ResolutionTier::Alias("1-Idle".into()))
        );

        loader.start_background_load().unwrap().await.unwrap();
        assert_eq!(
            loader.events().resolution_of(&dead_hit),
            Some(ResolutionTier::Alias("7-Hit".into()))
        );
        assert_eq!(loader.table().player("8-Dead Hit").unwrap().len(), 8);

        let rebuilt = {
            let state = loader.lock_state();
            build(&state.raw, &loader.catalog, &loader.synth).unwrap()
        };
        for resolution in &rebuilt.resolutions {
            assert_eq!(
                loader.lock_state().resolutions.get(&resolution.slot),
                Some(resolution),
                "{}",
                resolution.slot
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_background_task_still_completes_the_session() {
        let loader = loader(Arc::new(MockSource::new()), false);
        loader.load_critical(&crate::scheduler::NoProgress).await.unwrap();
        loader.background_started.store(true, Ordering::Release);

        let guard = BackgroundGuard {
            loader: Arc::clone(&loader),
            finished: false,
        };
        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("background task blew up");
        });
        assert!(handle.await.is_err());

        assert_eq!(loader.phase(), LoadPhase::Complete);
        assert!(matches!(
            loader.wait_background().await,
            Err(LoadError::BackgroundAborted)
        ));
    }

    #[tokio::test]
    async fn invalid_sprite_size_is_fatal() {
        let config = LoaderConfig {
            sprite_size: 0,
            ..LoaderConfig::default()
        };
        let err = Loader::new(config, AssetManifest::pirate_bomb(), Arc::new(MockSource::new()))
            .err()
            .expect("synthesizer rejects size 0");
        assert!(matches!(err, LoadError::Synthesis(SynthesisError::InvalidSize(0))));
    }

    #[tokio::test]
    async fn bad_config_and_manifest_are_rejected() {
        let config = LoaderConfig {
            fetch_timeout_ms: 0,
            ..LoaderConfig::default()
        };
        let err = Loader::new(config, AssetManifest::pirate_bomb(), Arc::new(MockSource::new()))
            .err()
            .expect("zero timeout");
        assert!(matches!(err, LoadError::Config(_)));

        let mut manifest = AssetManifest::pirate_bomb();
        manifest.critical.push(ManifestEntry {
            slot: SlotKey::player("1-Idle"),
            spec: AssetSpec::Frames(AnimationSpec::new(AssetPath::new("dup"), 1)),
            priority: None,
        });
        let err = Loader::new(LoaderConfig::default(), manifest, Arc::new(MockSource::new()))
            .err()
            .expect("duplicate slot");
        assert!(matches!(err, LoadError::Config(_)));
    }

    #[test]
    fn lazy_priorities_default_by_kind() {
        let manifest = AssetManifest::pirate_bomb();
        let tile = manifest
            .find(&SlotKey::object("tiles", "block2"))
            .unwrap();
        assert_eq!(lazy_priority(tile), LoadPriority::Low);
        let hit = manifest.find(&SlotKey::player("7-Hit")).unwrap();
        assert_eq!(lazy_priority(hit), LoadPriority::Medium);
    }
}
