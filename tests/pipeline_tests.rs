//! Integration tests for the single-flight frame analysis pipeline
//!
//! Covers frame dropping under load, buffer accounting on every exit path,
//! and the single-shot/continuous resume behavior.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use rust_scan::models::LuminanceRegion;
use rust_scan::{
    AnalysisContext, AnalysisListener, BinarizerKind, Code, CodeFormat, DecodeConfig, DecodeError,
    DecodeHints, Decoder, Frame, FrameAnalysisPipeline, PipelineState, Rotation, ScanError,
    ScanMode, ScanResult,
};

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, PartialEq)]
enum Outcome {
    Decoded(String),
    NotFound,
    Fault,
}

/// Forwards every outcome over a channel; optionally keeps result buffers
struct Events {
    sender: Mutex<Sender<Outcome>>,
    kept: Mutex<Vec<ScanResult>>,
    keep_results: bool,
}

impl Events {
    fn new(keep_results: bool) -> (Arc<Self>, Receiver<Outcome>) {
        let (sender, receiver) = mpsc::channel();
        let events = Arc::new(Self {
            sender: Mutex::new(sender),
            kept: Mutex::new(Vec::new()),
            keep_results,
        });
        (events, receiver)
    }

    fn send(&self, outcome: Outcome) {
        let _ = self.sender.lock().unwrap().send(outcome);
    }
}

impl AnalysisListener for Events {
    fn on_result(&self, result: ScanResult) {
        self.send(Outcome::Decoded(result.code().text.clone()));
        if self.keep_results {
            self.kept.lock().unwrap().push(result);
        }
    }

    fn on_failure(&self, reason: Option<&ScanError>) {
        self.send(match reason {
            Some(_) => Outcome::Fault,
            None => Outcome::NotFound,
        });
    }
}

/// Blocks inside every call until the test releases it
struct Gate {
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<bool>>,
}

impl Decoder for Gate {
    fn decode_with_binarizer(
        &self,
        _region: &LuminanceRegion,
        _hints: &DecodeHints,
        _binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        let _ = self.started.lock().unwrap().send(());
        let found = self
            .release
            .lock()
            .unwrap()
            .recv_timeout(TIMEOUT)
            .unwrap_or(false);
        if found {
            Ok(Code::new("gate", CodeFormat::QrCode))
        } else {
            Err(DecodeError::NotFound)
        }
    }
}

struct Always(Result<&'static str, DecodeError>);

impl Decoder for Always {
    fn decode_with_binarizer(
        &self,
        _region: &LuminanceRegion,
        _hints: &DecodeHints,
        _binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        self.0.clone().map(|text| Code::new(text, CodeFormat::QrCode))
    }
}

struct Panics;

impl Decoder for Panics {
    fn decode_with_binarizer(
        &self,
        _region: &LuminanceRegion,
        _hints: &DecodeHints,
        _binarizer: BinarizerKind,
    ) -> Result<Code, DecodeError> {
        panic!("decoder blew up");
    }
}

fn every_tier() -> DecodeConfig {
    DecodeConfig::default()
        .with_full_area_scan(true)
        .with_vertical_code(true, true)
        .with_luminance_invert(true, true)
}

fn frame(data: &[u8]) -> Frame<'_> {
    Frame::luma(data, 8, 8, Rotation::Deg0)
}

/// The listener hears about a frame before its slot is released
fn wait_until_idle<D: Decoder + 'static>(pipeline: &FrameAnalysisPipeline<D>) {
    let deadline = Instant::now() + TIMEOUT;
    while pipeline.state() != PipelineState::Idle {
        assert!(Instant::now() < deadline, "pipeline never went idle");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_frames_dropped_while_analyzing() {
    let (started_tx, started) = mpsc::channel();
    let (release, release_rx) = mpsc::channel();
    let gate = Gate {
        started: Mutex::new(started_tx),
        release: Mutex::new(release_rx),
    };
    let (events, outcomes) = Events::new(false);
    let pipeline = FrameAnalysisPipeline::builder(gate, events)
        .config(DecodeConfig::default().with_full_area_scan(true).with_multi_decode(false))
        .context(AnalysisContext::dedicated().unwrap())
        .build()
        .unwrap();
    let data = vec![128u8; 64];

    pipeline.on_frame_available(&frame(&data));
    started.recv_timeout(TIMEOUT).unwrap();
    assert_eq!(pipeline.state(), PipelineState::Analyzing);

    for _ in 0..10 {
        pipeline.on_frame_available(&frame(&data));
    }
    let stats = pipeline.stats();
    assert_eq!(stats.frames_received, 11);
    assert_eq!(stats.dropped_busy, 10);
    assert_eq!(stats.analyzed, 1);

    let pool = pipeline.pool().stats();
    assert_eq!(pool.allocated, 1);
    assert!(pool.idle < pool.allocated);
    // no second analysis started
    assert!(started.try_recv().is_err());

    release.send(false).unwrap();
    assert_eq!(outcomes.recv_timeout(TIMEOUT).unwrap(), Outcome::NotFound);
    wait_until_idle(&pipeline);
    assert_eq!(pipeline.pool().stats().idle, 1);

    // the next frame is accepted again and reuses the buffer
    pipeline.on_frame_available(&frame(&data));
    started.recv_timeout(TIMEOUT).unwrap();
    release.send(true).unwrap();
    assert_eq!(
        outcomes.recv_timeout(TIMEOUT).unwrap(),
        Outcome::Decoded("gate".to_string())
    );
    let pool = pipeline.pool().stats();
    assert_eq!(pool.allocated, 1);
    assert_eq!(pool.reuses, 1);
}

#[test]
fn test_no_leak_when_decoder_errors() {
    let (events, outcomes) = Events::new(false);
    let pipeline = FrameAnalysisPipeline::builder(
        Always(Err(DecodeError::Checksum("bad".into()))),
        events,
    )
    .config(every_tier())
    .build()
    .unwrap();
    let data = vec![0u8; 64];

    pipeline.on_frame_available(&frame(&data));

    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.pool().stats().in_use(), 0);
    assert_eq!(outcomes.try_recv().unwrap(), Outcome::NotFound);
    assert_eq!(pipeline.stats().not_found, 1);
}

#[test]
fn test_no_leak_when_decoder_panics() {
    let (events, outcomes) = Events::new(false);
    let pipeline = FrameAnalysisPipeline::builder(Panics, events)
        .config(every_tier())
        .build()
        .unwrap();
    let data = vec![0u8; 64];

    for _ in 0..3 {
        pipeline.on_frame_available(&frame(&data));
        assert_eq!(pipeline.state(), PipelineState::Idle);
        assert_eq!(outcomes.try_recv().unwrap(), Outcome::NotFound);
    }
    let pool = pipeline.pool().stats();
    assert_eq!(pool.in_use(), 0);
    assert_eq!(pool.allocated, 1);
    assert_eq!(pipeline.stats().faults, 0);
}

#[test]
fn test_single_shot_keeps_buffer_until_caller_drops_it() {
    let (events, outcomes) = Events::new(true);
    let pipeline = FrameAnalysisPipeline::builder(Always(Ok("kept")), events.clone())
        .config(every_tier())
        .build()
        .unwrap();
    let data: Vec<u8> = (0..64).collect();

    pipeline.on_frame_available(&frame(&data));
    assert_eq!(outcomes.try_recv().unwrap(), Outcome::Decoded("kept".into()));
    assert!(pipeline.is_awaiting_resume());
    assert_eq!(pipeline.pool().stats().in_use(), 1);

    {
        let kept = events.kept.lock().unwrap();
        assert_eq!(&kept[0].buffer[..], &data[..]);
        assert_eq!(kept[0].metadata.width, 8);
    }

    // still holding: more frames are dropped, even after the buffer returns
    events.kept.lock().unwrap().clear();
    assert_eq!(pipeline.pool().stats().in_use(), 0);
    pipeline.on_frame_available(&frame(&data));
    assert!(outcomes.try_recv().is_err());
    assert_eq!(pipeline.stats().dropped_busy, 1);

    assert!(pipeline.resume());
    pipeline.on_frame_available(&frame(&data));
    assert_eq!(outcomes.try_recv().unwrap(), Outcome::Decoded("kept".into()));
}

#[test]
fn test_continuous_mode_returns_to_idle_after_callback() {
    let (events, outcomes) = Events::new(false);
    let pipeline = FrameAnalysisPipeline::builder(Always(Ok("again")), events)
        .config(every_tier())
        .mode(ScanMode::Continuous)
        .build()
        .unwrap();
    let data = vec![0u8; 64];

    for _ in 0..3 {
        pipeline.on_frame_available(&frame(&data));
        assert_eq!(pipeline.state(), PipelineState::Idle);
    }
    assert_eq!(outcomes.try_iter().count(), 3);
    assert!(!pipeline.resume());
    assert_eq!(pipeline.stats().decoded, 3);
}

/// Resumes the pipeline from inside the result callback
struct ResumeImmediately {
    pipeline: OnceLock<Weak<FrameAnalysisPipeline<Always>>>,
    resumed: Mutex<Vec<bool>>,
}

impl AnalysisListener for ResumeImmediately {
    fn on_result(&self, _result: ScanResult) {
        let resumed = self
            .pipeline
            .get()
            .and_then(Weak::upgrade)
            .map(|pipeline| pipeline.resume())
            .unwrap_or(false);
        self.resumed.lock().unwrap().push(resumed);
    }
}

#[test]
fn test_resume_from_inside_result_callback() {
    let listener = Arc::new(ResumeImmediately {
        pipeline: OnceLock::new(),
        resumed: Mutex::new(Vec::new()),
    });
    let pipeline = Arc::new(
        FrameAnalysisPipeline::builder(Always(Ok("now")), listener.clone())
            .config(every_tier())
            .build()
            .unwrap(),
    );
    let _ = listener.pipeline.set(Arc::downgrade(&pipeline));
    let data = vec![0u8; 64];

    pipeline.on_frame_available(&frame(&data));
    pipeline.on_frame_available(&frame(&data));

    assert_eq!(*listener.resumed.lock().unwrap(), vec![true, true]);
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.stats().dropped_busy, 0);
}

#[test]
fn test_unsupported_frame_is_a_fault() {
    let (events, outcomes) = Events::new(false);
    let pipeline = FrameAnalysisPipeline::builder(Always(Ok("never")), events)
        .build()
        .unwrap();

    pipeline.on_frame_available(&Frame::luma(&[], 0, 0, Rotation::Deg0));

    assert_eq!(outcomes.try_recv().unwrap(), Outcome::Fault);
    assert_eq!(pipeline.state(), PipelineState::Idle);
    assert_eq!(pipeline.stats().faults, 1);
}

/// Offers another frame from inside the failure callback
struct Reentrant {
    pipeline: OnceLock<Weak<FrameAnalysisPipeline<Always>>>,
    outcomes: Mutex<Vec<Outcome>>,
}

impl AnalysisListener for Reentrant {
    fn on_result(&self, result: ScanResult) {
        self.outcomes
            .lock()
            .unwrap()
            .push(Outcome::Decoded(result.code().text.clone()));
    }

    fn on_failure(&self, reason: Option<&ScanError>) {
        self.outcomes.lock().unwrap().push(match reason {
            Some(_) => Outcome::Fault,
            None => Outcome::NotFound,
        });
        if let Some(pipeline) = self.pipeline.get().and_then(Weak::upgrade) {
            let data = vec![0u8; 64];
            pipeline.on_frame_available(&frame(&data));
        }
    }
}

#[test]
fn test_failure_is_reported_before_the_next_frame_is_accepted() {
    let listener = Arc::new(Reentrant {
        pipeline: OnceLock::new(),
        outcomes: Mutex::new(Vec::new()),
    });
    let pipeline = Arc::new(
        FrameAnalysisPipeline::builder(Always(Err(DecodeError::NotFound)), listener.clone())
            .config(DecodeConfig::default().with_full_area_scan(true))
            .build()
            .unwrap(),
    );
    let _ = listener.pipeline.set(Arc::downgrade(&pipeline));
    let data = vec![0u8; 64];

    pipeline.on_frame_available(&frame(&data));

    // the frame pushed from the callback found the slot still taken
    assert_eq!(*listener.outcomes.lock().unwrap(), vec![Outcome::NotFound]);
    let stats = pipeline.stats();
    assert_eq!(stats.frames_received, 2);
    assert_eq!(stats.dropped_busy, 1);
    assert_eq!(stats.analyzed, 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}

#[test]
fn test_fault_is_reported_before_the_next_frame_is_accepted() {
    let listener = Arc::new(Reentrant {
        pipeline: OnceLock::new(),
        outcomes: Mutex::new(Vec::new()),
    });
    let pipeline = Arc::new(
        FrameAnalysisPipeline::builder(Always(Ok("unused")), listener.clone())
            .build()
            .unwrap(),
    );
    let _ = listener.pipeline.set(Arc::downgrade(&pipeline));

    pipeline.on_frame_available(&Frame::luma(&[], 0, 0, Rotation::Deg0));

    assert_eq!(*listener.outcomes.lock().unwrap(), vec![Outcome::Fault]);
    assert_eq!(pipeline.stats().dropped_busy, 1);
    assert_eq!(pipeline.state(), PipelineState::Idle);
}
