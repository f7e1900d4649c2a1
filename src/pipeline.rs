//! Frame analysis pipeline
//!
//! Accepts camera frames, analyzes at most one at a time, and reports the
//! outcome through an [`AnalysisListener`]. Frames arriving while an
//! analysis is in flight are dropped, never queued: the producer only ever
//! performs one atomic test-and-set and a luminance copy.
//!
//! Per accepted frame:
//! 1. Copy the luminance into a pooled buffer (producer thread)
//! 2. Rotate sideways frames upright (analysis context)
//! 3. Select the region of interest
//! 4. Run the decode strategy
//! 5. Notify the listener; the buffer goes back to the pool unless the
//!    result hands it to the caller

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace, warn};

use crate::decoder::{AnalysisResult, DecodeConfig, DecodeStrategy, Decoded, Decoder};
use crate::error::{Result, ScanError, panic_message};
use crate::models::{Code, Frame, FrameMetadata, LuminancePlane, Rect, Rotation};
use crate::utils::grayscale::extract_luminance_into;
use crate::utils::memory_pool::{BufferLease, FrameBufferPool};
use crate::utils::region::select_region;
use crate::utils::rotation::rotate90_into;

const IDLE: u8 = 0;
const ANALYZING: u8 = 1;
/// Single-shot success delivered, waiting for `resume()`
const AWAITING_RESUME: u8 = 2;

/// What happens after a successful decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Stay busy after a result until the caller calls `resume()`
    #[default]
    SingleShot,
    /// Accept the next frame as soon as the result callback returns
    Continuous,
}

/// Externally visible pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No buffer checked out; the next frame will be analyzed
    Idle,
    /// A frame is being analyzed, or a single-shot result awaits `resume()`
    Analyzing,
}

/// Where analysis runs
#[derive(Debug, Clone, Default)]
pub enum AnalysisContext {
    /// On the thread that delivered the frame
    #[default]
    Inline,
    /// On a rayon pool, normally the single thread from [`AnalysisContext::dedicated`]
    Pool(Arc<rayon::ThreadPool>),
}

impl AnalysisContext {
    /// A single dedicated analysis thread.
    ///
    /// Panics that escape a job are logged by the pool's panic handler
    /// instead of aborting the process.
    pub fn dedicated() -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|index| format!("scan-analysis-{index}"))
            .panic_handler(|payload| {
                error!(panic = %panic_message(payload.as_ref()), "analysis thread panicked");
            })
            .build()?;
        Ok(Self::Pool(Arc::new(pool)))
    }

    fn run<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Inline => job(),
            Self::Pool(pool) => pool.spawn(job),
        }
    }
}

/// A successful analysis, handed to [`AnalysisListener::on_result`]
#[derive(Debug)]
pub struct ScanResult {
    /// The code and the attempt that produced it
    pub decoded: Decoded,
    /// The frame's luminance, in the frame's original orientation.
    /// Dropping it returns the buffer to the pool.
    pub buffer: BufferLease,
    /// Frame dimensions, rotation and the region analyzed
    pub metadata: FrameMetadata,
}

impl ScanResult {
    pub fn code(&self) -> &Code {
        &self.decoded.code
    }
}

/// Receives analysis outcomes. Called from the analysis context.
pub trait AnalysisListener: Send + Sync {
    /// A code was decoded
    fn on_result(&self, result: ScanResult);

    /// Nothing was decoded (`None`) or the frame could not be analyzed
    fn on_failure(&self, _reason: Option<&ScanError>) {}
}

/// Counters since the pipeline was built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub frames_received: u64,
    pub dropped_busy: u64,
    pub dropped_disabled: u64,
    pub analyzed: u64,
    pub decoded: u64,
    pub not_found: u64,
    pub faults: u64,
}

#[derive(Default)]
struct Counters {
    frames_received: AtomicU64,
    dropped_busy: AtomicU64,
    dropped_disabled: AtomicU64,
    analyzed: AtomicU64,
    decoded: AtomicU64,
    not_found: AtomicU64,
    faults: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            dropped_busy: self.dropped_busy.load(Ordering::Relaxed),
            dropped_disabled: self.dropped_disabled.load(Ordering::Relaxed),
            analyzed: self.analyzed.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

/// Owns the in-flight slot. Dropping it returns the pipeline to idle.
struct InFlight {
    state: Arc<AtomicU8>,
    armed: bool,
}

impl InFlight {
    /// Keep the slot taken until `resume()`
    fn hold(mut self) {
        self.armed = false;
        self.state.store(AWAITING_RESUME, Ordering::Release);
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.armed {
            self.state.store(IDLE, Ordering::Release);
        }
    }
}

/// What the analysis context needs to know about an accepted frame
#[derive(Debug, Clone, Copy)]
struct FrameInfo {
    width: usize,
    height: usize,
    rotation: Rotation,
}

struct Shared<D> {
    strategy: DecodeStrategy<D>,
    config: DecodeConfig,
    mode: ScanMode,
    pool: Arc<FrameBufferPool>,
    listener: Arc<dyn AnalysisListener>,
    state: Arc<AtomicU8>,
    enabled: AtomicBool,
    counters: Counters,
    /// Upright copy of sideways frames; only the in-flight analysis touches it
    upright: Mutex<Vec<u8>>,
}

impl<D: Decoder + 'static> Shared<D> {
    fn analyze(&self, lease: BufferLease, info: FrameInfo, slot: InFlight) {
        Counters::bump(&self.counters.analyzed);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_analysis(&lease, info)));

        match outcome {
            Ok(Ok((AnalysisResult::Decoded(decoded), region))) => {
                Counters::bump(&self.counters.decoded);
                let result = ScanResult {
                    decoded,
                    buffer: lease,
                    metadata: FrameMetadata {
                        width: info.width,
                        height: info.height,
                        rotation: info.rotation,
                        region,
                    },
                };
                match self.mode {
                    ScanMode::SingleShot => {
                        slot.hold();
                        if !self.deliver_result(result) {
                            // listener panicked; nobody will call resume()
                            self.state.store(IDLE, Ordering::Release);
                        }
                    }
                    ScanMode::Continuous => {
                        self.deliver_result(result);
                        drop(slot);
                    }
                }
            }
            Ok(Ok((AnalysisResult::NotFound, _))) => {
                Counters::bump(&self.counters.not_found);
                drop(lease);
                // notify before releasing so outcomes reach the listener in frame order
                self.deliver_failure(None);
                drop(slot);
            }
            Ok(Err(err)) => {
                error!(error = %err, "frame analysis failed");
                drop(lease);
                self.fail(slot, err);
            }
            Err(payload) => {
                let err = ScanError::AnalysisPanic(panic_message(payload.as_ref()));
                error!(error = %err, "frame analysis panicked");
                drop(lease);
                self.fail(slot, err);
            }
        }
    }

    fn run_analysis(&self, luminance: &[u8], info: FrameInfo) -> Result<(AnalysisResult, Rect)> {
        let mut upright = self.upright.lock().unwrap_or_else(PoisonError::into_inner);

        let (samples, width, height) = if info.rotation.is_sideways() {
            upright.resize(info.width * info.height, 0);
            rotate90_into(luminance, info.width, info.height, &mut upright);
            (&upright[..], info.height, info.width)
        } else {
            (luminance, info.width, info.height)
        };

        let plane = LuminancePlane::new(samples, width, height)?;
        let region = select_region(width, height, &self.config);
        trace!(width, height, %region, rotation = info.rotation.degrees(), "analyzing frame");

        Ok((self.strategy.decode(&plane, region, &self.config), region))
    }

    fn fail(&self, slot: InFlight, err: ScanError) {
        Counters::bump(&self.counters.faults);
        self.deliver_failure(Some(&err));
        drop(slot);
    }

    /// Returns false if the listener panicked
    fn deliver_result(&self, result: ScanResult) -> bool {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| self.listener.on_result(result)));
        if let Err(payload) = &delivered {
            warn!(panic = %panic_message(payload.as_ref()), "result listener panicked");
        }
        delivered.is_ok()
    }

    fn deliver_failure(&self, reason: Option<&ScanError>) {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| self.listener.on_failure(reason)));
        if let Err(payload) = delivered {
            warn!(panic = %panic_message(payload.as_ref()), "failure listener panicked");
        }
    }
}

/// Configures and builds a [`FrameAnalysisPipeline`]
pub struct PipelineBuilder<D> {
    decoder: D,
    listener: Arc<dyn AnalysisListener>,
    config: DecodeConfig,
    mode: ScanMode,
    context: AnalysisContext,
    pool: Option<Arc<FrameBufferPool>>,
}

impl<D: Decoder + 'static> PipelineBuilder<D> {
    pub fn config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn context(mut self, context: AnalysisContext) -> Self {
        self.context = context;
        self
    }

    /// Share an existing buffer pool instead of creating one
    pub fn pool(mut self, pool: Arc<FrameBufferPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<FrameAnalysisPipeline<D>> {
        self.config.validate()?;
        Ok(FrameAnalysisPipeline {
            shared: Arc::new(Shared {
                strategy: DecodeStrategy::new(self.decoder),
                config: self.config,
                mode: self.mode,
                pool: self.pool.unwrap_or_else(FrameBufferPool::new),
                listener: self.listener,
                state: Arc::new(AtomicU8::new(IDLE)),
                enabled: AtomicBool::new(true),
                counters: Counters::default(),
                upright: Mutex::new(Vec::new()),
            }),
            context: self.context,
        })
    }
}

/// Single-flight frame analyzer
pub struct FrameAnalysisPipeline<D> {
    shared: Arc<Shared<D>>,
    context: AnalysisContext,
}

impl<D: Decoder + 'static> FrameAnalysisPipeline<D> {
    /// Start configuring a pipeline around `decoder`
    pub fn builder(decoder: D, listener: Arc<dyn AnalysisListener>) -> PipelineBuilder<D> {
        PipelineBuilder {
            decoder,
            listener,
            config: DecodeConfig::default(),
            mode: ScanMode::default(),
            context: AnalysisContext::default(),
            pool: None,
        }
    }

    /// Offer a frame for analysis.
    ///
    /// Never blocks on an in-flight analysis: if one is running the frame is
    /// dropped. Otherwise the luminance is copied into a pooled buffer before
    /// returning, so `frame` may be reused immediately. All outcomes,
    /// including an invalid frame, are reported through the listener.
    pub fn on_frame_available(&self, frame: &Frame<'_>) {
        let shared = &self.shared;
        Counters::bump(&shared.counters.frames_received);

        if !shared.enabled.load(Ordering::Acquire) {
            Counters::bump(&shared.counters.dropped_disabled);
            trace!("analysis disabled, frame dropped");
            return;
        }

        if shared
            .state
            .compare_exchange(IDLE, ANALYZING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            Counters::bump(&shared.counters.dropped_busy);
            trace!("analysis in flight, frame dropped");
            return;
        }
        let slot = InFlight {
            state: Arc::clone(&shared.state),
            armed: true,
        };

        if let Err(err) = frame.validate() {
            debug!(error = %err, width = frame.width, height = frame.height, "rejected frame");
            shared.fail(slot, err);
            return;
        }
        let mut lease = shared.pool.acquire(frame.luminance_len());
        if let Err(err) = extract_luminance_into(frame, &mut lease) {
            drop(lease);
            shared.fail(slot, err);
            return;
        }

        let info = FrameInfo {
            width: frame.width,
            height: frame.height,
            rotation: frame.rotation,
        };
        let shared = Arc::clone(shared);
        self.context.run(move || shared.analyze(lease, info, slot));
    }

    /// Release a single-shot hold so the next frame is analyzed.
    ///
    /// Returns false if the pipeline was not waiting for a resume.
    pub fn resume(&self) -> bool {
        let resumed = self
            .shared
            .state
            .compare_exchange(AWAITING_RESUME, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if resumed {
            debug!("analysis resumed");
        }
        resumed
    }

    /// Pause or restart analysis without tearing the session down
    pub fn set_analyze_enabled(&self, enabled: bool) {
        self.shared.enabled.store(enabled, Ordering::Release);
    }

    pub fn is_analyze_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::Acquire)
    }

    pub fn state(&self) -> PipelineState {
        match self.shared.state.load(Ordering::Acquire) {
            IDLE => PipelineState::Idle,
            _ => PipelineState::Analyzing,
        }
    }

    /// True after a single-shot result until `resume()`
    pub fn is_awaiting_resume(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == AWAITING_RESUME
    }

    pub fn stats(&self) -> PipelineStats {
        self.shared.counters.snapshot()
    }

    pub fn pool(&self) -> &Arc<FrameBufferPool> {
        &self.shared.pool
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.shared.config
    }

    pub fn mode(&self) -> ScanMode {
        self.shared.mode
    }
}
