//! Bounded-concurrency batch loading.
//!
//! Requests are split into sequential batches of `max_concurrent`. Every
//! fetch in a batch is issued at once and the batch is settled (success or
//! failure) before the next one starts. Between batches the task yields so
//! the render loop sharing the thread gets a turn.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use kaboom_core::{AnimationSpec, AssetPath, AssetSpec, LoadPriority, SlotKey};

use crate::config::BatchSizes;
use crate::error::{FetchError, SynthesisError};
use crate::fetch::Fetcher;
use crate::synth::{SpriteCategory, Synthesizer};
use crate::table::{Frame, FrameSequence, ImageHandle};

/// Identifies one frame request: the slot it fills and its 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    pub slot: SlotKey,
    pub frame: u32,
}

#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub id: RequestId,
    pub path: AssetPath,
    pub priority: LoadPriority,
}

impl LoadRequest {
    /// One request per frame of `spec`, in declared order.
    pub fn for_spec(slot: &SlotKey, spec: &AssetSpec, priority: LoadPriority) -> Vec<Self> {
        spec.frame_paths()
            .into_iter()
            .enumerate()
            .map(|(i, path)| Self {
                id: RequestId {
                    slot: slot.clone(),
                    frame: i as u32,
                },
                path,
                priority,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub id: RequestId,
    pub path: AssetPath,
    pub result: Result<ImageHandle, FetchError>,
}

impl LoadOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Receives `(completed, total)` updates.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Counts completed requests over a known total and forwards monotonic
/// updates to an observer. One counter can span several batches or tiers.
pub struct ProgressCounter<'a> {
    observer: &'a dyn ProgressObserver,
    total: usize,
    completed: AtomicUsize,
}

impl<'a> ProgressCounter<'a> {
    pub fn new(observer: &'a dyn ProgressObserver, total: usize) -> Self {
        Self {
            observer,
            total,
            completed: AtomicUsize::new(0),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn advance(&self, n: usize) {
        let total = self.total;
        let now = self
            .completed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some((c + n).min(total))
            })
            .map_or(total, |prev| (prev + n).min(total));
        self.observer.on_progress(now, total);
    }

    /// Jump to `(total, total)`. Always reports, even if already complete.
    pub fn finish(&self) {
        self.completed.store(self.total, Ordering::Relaxed);
        self.observer.on_progress(self.total, self.total);
    }
}

/// Load `requests` and settle every one of them. Outcomes come back in
/// request order.
pub async fn load_batch(
    fetcher: &Fetcher,
    requests: Vec<LoadRequest>,
    max_concurrent: usize,
    pause: Duration,
    progress: &dyn ProgressObserver,
) -> Vec<LoadOutcome> {
    let counter = ProgressCounter::new(progress, requests.len());
    let mut outcomes = Vec::with_capacity(requests.len());
    load_batch_into(fetcher, &requests, max_concurrent, pause, &counter, &mut outcomes).await;
    counter.finish();
    outcomes
}

/// Like [`load_batch`], but appends each settled batch to `sink` and advances
/// a caller-owned counter. If the future is dropped part way, `sink` keeps
/// every batch that settled before that.
pub async fn load_batch_into(
    fetcher: &Fetcher,
    requests: &[LoadRequest],
    max_concurrent: usize,
    pause: Duration,
    progress: &ProgressCounter<'_>,
    sink: &mut Vec<LoadOutcome>,
) {
    let chunk_size = max_concurrent.max(1);
    for (index, chunk) in requests.chunks(chunk_size).enumerate() {
        if index > 0 {
            tokio::task::yield_now().await;
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let results = join_all(chunk.iter().map(|request| fetcher.fetch(&request.path))).await;
        for (request, result) in chunk.iter().zip(results) {
            if let Err(err) = &result {
                log::warn!("Asset {} failed: {}", request.id.slot, err);
            }
            sink.push(LoadOutcome {
                id: request.id.clone(),
                path: request.path.clone(),
                result,
            });
        }
        progress.advance(chunk.len());
    }
}

/// Run requests tier by tier, Critical first, each tier with its own batch
/// size.
pub async fn load_tiered(
    fetcher: &Fetcher,
    requests: Vec<LoadRequest>,
    sizes: &BatchSizes,
    pause: Duration,
    progress: &ProgressCounter<'_>,
    sink: &mut Vec<LoadOutcome>,
) {
    let mut tiers: BTreeMap<LoadPriority, Vec<LoadRequest>> = BTreeMap::new();
    for request in requests {
        tiers.entry(request.priority).or_default().push(request);
    }
    for (priority, tier) in tiers {
        log::debug!("Loading {} {} asset(s)", tier.len(), priority);
        load_batch_into(
            fetcher,
            &tier,
            sizes.for_priority(priority),
            pause,
            progress,
            sink,
        )
        .await;
    }
}

/// Place outcomes for one slot at their declared frame index, back-filling
/// every missing or failed position with a synthesized frame. Returns the
/// sequence and the back-filled indices.
pub fn assemble_frames<'a>(
    slot: &SlotKey,
    frame_count: u32,
    outcomes: impl IntoIterator<Item = &'a LoadOutcome>,
    synth: &Synthesizer,
) -> Result<(FrameSequence, Vec<u32>), SynthesisError> {
    let count = frame_count.max(1) as usize;
    let mut positions: Vec<Option<ImageHandle>> = vec![None; count];
    for outcome in outcomes {
        if &outcome.id.slot != slot {
            continue;
        }
        if let (Some(position), Ok(image)) =
            (positions.get_mut(outcome.id.frame as usize), &outcome.result)
        {
            *position = Some(image.clone());
        }
    }

    let mut fallback = None;
    let mut backfilled = Vec::new();
    let mut frames = Vec::with_capacity(count);
    for (index, position) in positions.into_iter().enumerate() {
        match position {
            Some(image) => frames.push(Frame::loaded(image)),
            None => {
                let image = match &fallback {
                    Some(image) => ImageHandle::clone(image),
                    None => {
                        let image = synth.synthesize(SpriteCategory::for_entity(&slot.entity))?;
                        fallback = Some(image.clone());
                        image
                    }
                };
                backfilled.push(index as u32);
                frames.push(Frame::synthesized(image));
            }
        }
    }

    // `count` is at least one, so the sequence is never empty.
    let sequence = FrameSequence::new(frames).ok_or(SynthesisError::Raster {
        width: synth.size(),
        height: synth.size(),
    })?;
    Ok((sequence, backfilled))
}

/// Load every frame of one animation. The result always has exactly
/// `spec.frame_count` frames, element `i` coming from `<path>/<i+1>.png` or a
/// placeholder if that frame failed.
pub async fn load_frames(
    fetcher: &Fetcher,
    slot: &SlotKey,
    spec: &AnimationSpec,
    priority: LoadPriority,
    max_concurrent: usize,
    synth: &Synthesizer,
    progress: &dyn ProgressObserver,
) -> Result<FrameSequence, SynthesisError> {
    let requests = LoadRequest::for_spec(slot, &AssetSpec::Frames(spec.clone()), priority);
    let outcomes = load_batch(fetcher, requests, max_concurrent, Duration::ZERO, progress).await;
    let (sequence, backfilled) = assemble_frames(slot, spec.frame_count, &outcomes, synth)?;
    if !backfilled.is_empty() {
        log::warn!(
            "{}: back-filled {} of {} frame(s) with placeholders",
            slot,
            backfilled.len(),
            spec.frame_count
        );
    }
    Ok(sequence)
}
