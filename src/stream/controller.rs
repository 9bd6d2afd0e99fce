//! Streaming detection controller.
//!
//! Drives the detection pipeline over a live frame stream: rate-limits
//! inference, smooths the displayed detection across frames, and triggers
//! rate-limited auto-captures of high-confidence sightings.

use crate::constants::{detection, stream};
use crate::detect::{BirdDetector, Detection, NormalizedBox};
use crate::error::{Error, Result};
use crate::stream::capture::CaptureSink;
use crate::stream::source::FrameSource;
use image::DynamicImage;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Lifecycle of a stream controller. Transitions are one-way:
/// `Idle -> Loading -> Running -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, not started.
    Idle,
    /// Model loading in progress.
    Loading,
    /// Processing frames.
    Running,
    /// Terminal; the controller cannot be restarted.
    Stopped,
}

/// Tuning knobs for the streaming path.
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Confidence floor for frame detections, exclusive.
    pub confidence_threshold: f32,
    /// Minimum interval between processed frames in milliseconds.
    pub min_process_interval_ms: u64,
    /// Cooldown between auto-captures in milliseconds.
    pub capture_cooldown_ms: u64,
    /// Displayed confidence required to trigger an auto-capture.
    pub capture_confidence: f32,
    /// EMA factor applied to new values when smoothing.
    pub smoothing_factor: f32,
    /// Confidence jump over the displayed detection that replaces it.
    pub replace_confidence_delta: f32,
    /// Displayed detections at or above this survive empty frames.
    pub hold_confidence: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: detection::STREAM_CONFIDENCE_THRESHOLD,
            min_process_interval_ms: stream::MIN_PROCESS_INTERVAL_MS,
            capture_cooldown_ms: stream::CAPTURE_COOLDOWN_MS,
            capture_confidence: stream::CAPTURE_CONFIDENCE,
            smoothing_factor: stream::SMOOTHING_FACTOR,
            replace_confidence_delta: stream::REPLACE_CONFIDENCE_DELTA,
            hold_confidence: stream::HOLD_CONFIDENCE,
        }
    }
}

/// Monotonic time source, swappable for tests.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`Instant`].
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Outcome of offering one frame to the controller.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Frame dropped by the minimum processing interval.
    Skipped,
    /// Controller is not running; the frame (or its in-flight result) was
    /// discarded.
    Stopped,
    /// Frame processed; nothing is currently displayed.
    NoDetection,
    /// Frame processed; `detection` is the displayed (smoothed) result.
    Detected {
        /// The displayed detection after smoothing.
        detection: Detection,
        /// Whether this frame triggered an auto-capture.
        captured: bool,
    },
}

/// Handle for stopping a running stream from another thread.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    running: Arc<AtomicBool>,
}

impl StreamHandle {
    /// Request the stream to stop. In-flight frame results are discarded.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Streaming detection controller. Single-threaded by design; the only
/// cross-thread interaction is the stop flag exposed via [`StreamHandle`].
pub struct StreamController {
    detector: Arc<BirdDetector>,
    config: StreamConfig,
    clock: Box<dyn Clock>,
    state: StreamState,
    running: Arc<AtomicBool>,
    current: Option<Detection>,
    last_process_at: Option<u64>,
    last_capture_at: Option<u64>,
}

impl StreamController {
    /// Create an idle controller around an already-loaded detector.
    pub fn new(detector: Arc<BirdDetector>, config: StreamConfig) -> Self {
        Self::with_clock(detector, config, Box::new(SystemClock::default()))
    }

    /// Create a controller with an explicit time source.
    pub fn with_clock(
        detector: Arc<BirdDetector>,
        config: StreamConfig,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            detector,
            config,
            clock,
            state: StreamState::Idle,
            running: Arc::new(AtomicBool::new(false)),
            current: None,
            last_process_at: None,
            last_capture_at: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// The currently displayed detection, if any.
    pub fn current_detection(&self) -> Option<&Detection> {
        self.current.as_ref()
    }

    /// Transition to `Running` and hand out a stop handle.
    ///
    /// Fails with [`Error::StreamRestart`] once the controller has stopped;
    /// starting an already running controller is a no-op.
    pub fn start(&mut self) -> Result<StreamHandle> {
        match self.state {
            StreamState::Stopped => return Err(Error::StreamRestart),
            StreamState::Running | StreamState::Loading => {}
            StreamState::Idle => {
                // The detector arrives pre-loaded, so Loading is momentary;
                // the state still surfaces for observers polling `state()`.
                self.state = StreamState::Loading;
                info!("stream starting");
                self.state = StreamState::Running;
                self.running.store(true, Ordering::SeqCst);
            }
        }
        Ok(StreamHandle {
            running: Arc::clone(&self.running),
        })
    }

    /// Stop the stream. Terminal; further frames are discarded.
    pub fn stop(&mut self) {
        if self.state != StreamState::Stopped {
            info!("stream stopped");
        }
        self.state = StreamState::Stopped;
        self.running.store(false, Ordering::SeqCst);
        self.current = None;
    }

    /// Offer one frame to the controller.
    ///
    /// Frames arriving within the minimum processing interval are dropped
    /// without inference. Pipeline errors on individual frames are logged
    /// and reported as [`TickOutcome::NoDetection`]; a broken frame never
    /// tears down the stream.
    pub fn process_frame(
        &mut self,
        frame: &DynamicImage,
        sink: &mut dyn CaptureSink,
    ) -> TickOutcome {
        if self.state != StreamState::Running || !self.running.load(Ordering::SeqCst) {
            self.stop();
            return TickOutcome::Stopped;
        }

        let now = self.clock.now_ms();
        if let Some(last) = self.last_process_at {
            if now.saturating_sub(last) < self.config.min_process_interval_ms {
                return TickOutcome::Skipped;
            }
        }
        self.last_process_at = Some(now);

        let detections = match self
            .detector
            .detect_frame(frame, self.config.confidence_threshold)
        {
            Ok(detections) => detections,
            Err(e) => {
                warn!("frame dropped: {e}");
                return TickOutcome::NoDetection;
            }
        };

        // A stop may have been requested while inference ran; the stale
        // result is discarded rather than displayed.
        if !self.running.load(Ordering::SeqCst) {
            self.stop();
            return TickOutcome::Stopped;
        }

        let best = detections.into_iter().next();
        self.current = merge_detection(self.current.take(), best, &self.config);

        match self.current.clone() {
            Some(detection) => {
                let captured = self.maybe_capture(frame, sink, now);
                TickOutcome::Detected {
                    detection,
                    captured,
                }
            }
            None => TickOutcome::NoDetection,
        }
    }

    /// Drive the controller over a frame source until it ends or the stop
    /// flag is raised.
    pub fn run(&mut self, source: &mut dyn FrameSource, sink: &mut dyn CaptureSink) -> Result<()> {
        self.start()?;

        loop {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            match source.next_frame()? {
                Some(frame) => {
                    if matches!(self.process_frame(&frame, sink), TickOutcome::Stopped) {
                        break;
                    }
                }
                None if source.is_live() => {}
                None => break,
            }

            std::thread::sleep(Duration::from_millis(stream::TICK_INTERVAL_MS));
        }

        self.stop();
        Ok(())
    }

    fn maybe_capture(&mut self, frame: &DynamicImage, sink: &mut dyn CaptureSink, now: u64) -> bool {
        let Some(detection) = &self.current else {
            return false;
        };
        if detection.confidence <= self.config.capture_confidence {
            return false;
        }
        if let Some(last) = self.last_capture_at {
            if now.saturating_sub(last) < self.config.capture_cooldown_ms {
                return false;
            }
        }

        // The cooldown restarts even when the write fails, so a broken sink
        // cannot busy-loop captures.
        self.last_capture_at = Some(now);

        match sink.capture(frame, detection) {
            Ok(()) => {
                debug!(
                    "auto-captured {} at {:.0}% confidence",
                    detection.species,
                    detection.confidence * 100.0
                );
                true
            }
            Err(e) => {
                warn!("capture failed: {e}");
                false
            }
        }
    }
}

/// Fold a frame's best detection into the displayed one.
///
/// A markedly more confident detection replaces the displayed one outright.
/// A weak one (below the hold threshold) leaves the prior display untouched
/// so weak signals cannot make it flicker. Anything in between keeps the
/// new detection but EMA-blends its box geometry against the prior one.
/// When the frame found nothing, a displayed detection at or above the hold
/// threshold survives, anything weaker is cleared.
fn merge_detection(
    current: Option<Detection>,
    incoming: Option<Detection>,
    config: &StreamConfig,
) -> Option<Detection> {
    match (current, incoming) {
        (None, incoming) => incoming,
        (Some(cur), None) => (cur.confidence >= config.hold_confidence).then_some(cur),
        (Some(cur), Some(new)) => {
            if new.confidence < config.hold_confidence {
                Some(cur)
            } else if new.confidence > cur.confidence + config.replace_confidence_delta {
                Some(new)
            } else {
                Some(smooth(&cur, new, config.smoothing_factor))
            }
        }
    }
}

/// Keep `new` but blend its box against `cur` with EMA factor `alpha`
/// applied to the new coordinates. Confidence is not blended; the new
/// detection's value stands.
fn smooth(cur: &Detection, new: Detection, alpha: f32) -> Detection {
    let lerp = |old: f32, fresh: f32| old * (1.0 - alpha) + fresh * alpha;
    Detection {
        bounding_box: NormalizedBox {
            x: lerp(cur.bounding_box.x, new.bounding_box.x),
            y: lerp(cur.bounding_box.y, new.bounding_box.y),
            width: lerp(cur.bounding_box.width, new.bounding_box.width),
            height: lerp(cur.bounding_box.height, new.bounding_box.height),
        },
        ..new
    }
}
