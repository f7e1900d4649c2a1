use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_scan::{
    AnalysisContext, AnalysisListener, AnalysisResult, CodeFormat, DecodeConfig, DecodeHints,
    Frame, FrameAnalysisPipeline, PipelineState, QrDecoder, Rotation, ScanError, ScanMode,
    ScanResult, decode_image,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rust-scan", version, about = "Barcode and QR frame analysis tools")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode codes from still images
    Decode(DecodeArgs),
    /// Replay an image as a camera stream through the analysis pipeline
    Stream(StreamArgs),
}

#[derive(Args)]
struct DecodeArgs {
    /// Input images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    decode: DecodeOptions,
}

#[derive(Args)]
struct StreamArgs {
    /// Image used for every frame
    image: PathBuf,

    /// Number of frames to push
    #[arg(long, default_value_t = 30)]
    frames: usize,

    /// Interval between frames in milliseconds
    #[arg(long, default_value_t = 33)]
    interval_ms: u64,

    /// Rotation reported with each frame (0, 90, 180, 270)
    #[arg(long, default_value_t = 0)]
    rotation: i32,

    /// Keep scanning after a result instead of waiting for a resume
    #[arg(long)]
    continuous: bool,

    #[command(flatten)]
    decode: DecodeOptions,
}

#[derive(Args)]
struct DecodeOptions {
    /// TOML decode configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated formats to look for (e.g. qr,code128)
    #[arg(long, value_delimiter = ',')]
    formats: Vec<CodeFormat>,
}

impl DecodeOptions {
    fn load(&self) -> Result<DecodeConfig> {
        let mut config = match &self.config {
            Some(path) => DecodeConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => DecodeConfig::default().with_hints(DecodeHints::qr_code()),
        };
        if !self.formats.is_empty() {
            config.hints = DecodeHints::for_formats(self.formats.iter().copied());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Command::Decode(args) => run_decode(args),
        Command::Stream(args) => run_stream(args),
    }
}

fn run_decode(args: &DecodeArgs) -> Result<()> {
    let config = args.decode.load()?;
    let decoder = QrDecoder::new();
    let mut found = 0usize;

    for path in &args.images {
        let image =
            image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let start = Instant::now();
        let result = decode_image(&decoder, &image, &config.hints)?;
        let elapsed = start.elapsed();

        match result {
            AnalysisResult::Decoded(decoded) => {
                found += 1;
                println!(
                    "{}: [{}] {} ({:?}/{:?}, {:.1} ms)",
                    path.display(),
                    decoded.code.format,
                    decoded.code.text,
                    decoded.attempt.variant,
                    decoded.attempt.binarizer,
                    elapsed.as_secs_f64() * 1000.0
                );
            }
            AnalysisResult::NotFound => println!("{}: no code found", path.display()),
        }
    }

    info!(found, total = args.images.len(), "decode finished");
    Ok(())
}

enum Event {
    Result(String),
    Failure(Option<String>),
}

/// Forwards outcomes to the thread driving the stream
struct ChannelListener {
    events: Sender<Event>,
}

impl AnalysisListener for ChannelListener {
    fn on_result(&self, result: ScanResult) {
        let text = format!("[{}] {}", result.code().format, result.code().text);
        let _ = self.events.send(Event::Result(text));
    }

    fn on_failure(&self, reason: Option<&ScanError>) {
        let _ = self
            .events
            .send(Event::Failure(reason.map(ToString::to_string)));
    }
}

fn run_stream(args: &StreamArgs) -> Result<()> {
    let config = args.decode.load()?;
    let rotation = Rotation::from_degrees(args.rotation)?;
    let luma = load_frame_luma(&args.image, rotation)?;
    let (width, height) = (luma.width() as usize, luma.height() as usize);

    let (events, received) = mpsc::channel();
    let mode = if args.continuous {
        ScanMode::Continuous
    } else {
        ScanMode::SingleShot
    };
    let listener = Arc::new(ChannelListener { events });
    let pipeline = FrameAnalysisPipeline::builder(QrDecoder::new(), listener)
        .config(config)
        .mode(mode)
        .context(AnalysisContext::dedicated()?)
        .build()?;

    let frame = Frame::luma(luma.as_raw(), width, height, rotation);
    let interval = Duration::from_millis(args.interval_ms);
    for _ in 0..args.frames {
        pipeline.on_frame_available(&frame);
        std::thread::sleep(interval);
        drain_events(&pipeline, &received);
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while pipeline.state() == PipelineState::Analyzing
        && !pipeline.is_awaiting_resume()
        && Instant::now() < deadline
    {
        std::thread::sleep(Duration::from_millis(5));
    }
    drain_events(&pipeline, &received);

    let stats = pipeline.stats();
    println!("Frames:       {}", stats.frames_received);
    println!("Analyzed:     {}", stats.analyzed);
    println!("Decoded:      {}", stats.decoded);
    println!("Not found:    {}", stats.not_found);
    println!("Dropped busy: {}", stats.dropped_busy);
    println!("Faults:       {}", stats.faults);
    let pool = pipeline.pool().stats();
    println!("Buffers:      {} allocated, {} reuses", pool.allocated, pool.reuses);
    Ok(())
}

fn drain_events(pipeline: &FrameAnalysisPipeline<QrDecoder>, received: &mpsc::Receiver<Event>) {
    while let Ok(event) = received.try_recv() {
        match event {
            Event::Result(text) => {
                println!("{text}");
                pipeline.resume();
            }
            Event::Failure(Some(reason)) => warn!(%reason, "frame failed"),
            Event::Failure(None) => {}
        }
    }
}

/// Load `path` as luminance, turned so the pipeline's upright rotation
/// restores it for sideways `rotation`s
fn load_frame_luma(path: &Path, rotation: Rotation) -> Result<image::GrayImage> {
    let image = image::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let luma = image.to_luma8();
    Ok(if rotation.is_sideways() {
        image::imageops::rotate270(&luma)
    } else {
        luma
    })
}
