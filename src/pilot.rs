//! Frame Loop Controller.
//!
//! Drives the pipeline: capture a frame, convert it to RGBA, run the
//! classifier, update the steering command, render diagnostics, repeat.
//! Every per-frame failure is absorbed locally: the iteration is skipped,
//! the previous command keeps applying, and the loop carries on. The only
//! way out of the loop is the cooperative shutdown flag, observed strictly
//! between iterations so no frame is left half processed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::{convert, CameraSource};
use crate::classify::ClassifierBackend;
use crate::control::{self, ControlCommand, ControlConfig, SteeringState};
use crate::display::DisplaySink;

/// Named loop states, in transition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopPhase {
    Init,
    Capturing,
    Converting,
    Inferring,
    Controlling,
    Rendering,
    ShuttingDown,
}

/// How one loop iteration ended.
///
/// Everything except `Steered` means the iteration was skipped at the named
/// stage and the previous command still applies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// Full pipeline ran; a fresh command was produced.
    Steered(ControlCommand),
    /// No frame arrived within the capture timeout.
    CaptureTimedOut,
    /// The capture device reported a fault.
    CaptureFailed,
    /// Color conversion rejected the frame.
    ConversionFailed,
    /// The classifier failed on this frame.
    InferenceFailed,
    /// The probability vector carried no usable signal.
    DegenerateProbabilities,
}

/// The frame loop: owns the capabilities and the cross-frame steering
/// state.
pub struct Pilot {
    // Field order is drop order: display, then classifier, then camera —
    // the reverse of acquisition.
    display: Option<Box<dyn DisplaySink>>,
    classifier: Box<dyn ClassifierBackend>,
    camera: CameraSource,
    control: ControlConfig,
    capture_timeout: Duration,
    frame_interval: Duration,
    shutdown: Arc<AtomicBool>,
    phase: LoopPhase,
    state: SteeringState,
    command: ControlCommand,
    fps: FpsTracker,
    iterations: u64,
    last_health_log: Instant,
}

impl Pilot {
    pub fn new(
        camera: CameraSource,
        classifier: Box<dyn ClassifierBackend>,
        display: Option<Box<dyn DisplaySink>>,
        control: ControlConfig,
        capture_timeout: Duration,
        target_fps: u32,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let frame_interval = Duration::from_millis(1000 / u64::from(target_fps.max(1)));
        Self {
            display,
            classifier,
            camera,
            control,
            capture_timeout,
            frame_interval,
            shutdown,
            phase: LoopPhase::Init,
            state: SteeringState::new(),
            command: ControlCommand::from_angle_rad(0.0),
            fps: FpsTracker::new(),
            iterations: 0,
            last_health_log: Instant::now(),
        }
    }

    /// The command currently applying (last-known-good).
    pub fn command(&self) -> ControlCommand {
        self.command
    }

    /// Current filtered turn angle in radians.
    pub fn filtered_angle_rad(&self) -> f32 {
        self.state.filtered_angle_rad()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Run one full iteration of the loop.
    pub fn step(&mut self) -> StepOutcome {
        self.iterations += 1;

        self.phase = LoopPhase::Capturing;
        let raw = match self.camera.capture(self.capture_timeout) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::warn!(
                    "no frame within {} ms; retrying",
                    self.capture_timeout.as_millis()
                );
                return StepOutcome::CaptureTimedOut;
            }
            Err(err) => {
                log::warn!("frame capture failed: {:#}", err);
                return StepOutcome::CaptureFailed;
            }
        };

        self.phase = LoopPhase::Converting;
        let rgba = match convert::to_rgba(&raw) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("color conversion failed, dropping frame: {:#}", err);
                return StepOutcome::ConversionFailed;
            }
        };

        self.phase = LoopPhase::Inferring;
        let probs = match self.classifier.infer(&rgba) {
            Ok(probs) => probs,
            Err(err) => {
                // A transient inference failure must not cause a steering
                // discontinuity; the previous command keeps applying.
                log::warn!("inference failed, holding previous command: {:#}", err);
                return StepOutcome::InferenceFailed;
            }
        };
        log::debug!(
            "class probabilities: {:.2} {:.2} {:.2} {:.2} {:.2} {:.2}",
            probs.0[0],
            probs.0[1],
            probs.0[2],
            probs.0[3],
            probs.0[4],
            probs.0[5]
        );

        self.phase = LoopPhase::Controlling;
        let Some(cues) = control::normalize(&probs, self.control.active_class_count) else {
            log::debug!("degenerate probability vector, holding previous command");
            return StepOutcome::DegenerateProbabilities;
        };
        let target = control::target_angle_rad(&cues, &self.control);
        let filtered = self.state.integrate(target, self.control.innovation_coeff);
        self.command = ControlCommand::from_angle_rad(filtered);
        self.fps.tick();
        log::debug!("turn angle: {:.2} deg", filtered.to_degrees());

        self.phase = LoopPhase::Rendering;
        if let Some(display) = self.display.as_mut() {
            let overlay = format!(
                "{} | {:4.1} fps | turn {:+6.2} deg",
                self.classifier.name(),
                self.fps.fps(),
                filtered.to_degrees()
            );
            if let Err(err) = display.set_overlay_text(&overlay) {
                log::warn!("display overlay failed: {:#}", err);
            }
            if let Err(err) = display.render(&rgba) {
                log::warn!("display render failed: {:#}", err);
            }
        }

        StepOutcome::Steered(self.command)
    }

    /// Run until the shutdown flag is observed at an iteration boundary.
    pub fn run(&mut self) {
        log::info!(
            "pilot loop running, one frame every {} ms",
            self.frame_interval.as_millis()
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            let started = Instant::now();
            self.step();

            if self.last_health_log.elapsed() >= Duration::from_secs(5) {
                let stats = self.camera.stats();
                log::info!(
                    "camera {}: {} frames, {} timeouts; command linear={:.3} angular={:.3}",
                    stats.device,
                    stats.frames_captured,
                    stats.timeouts,
                    self.command.linear,
                    self.command.angular
                );
                self.last_health_log = Instant::now();
            }

            // Pace to the target frame rate; a slow iteration starts the
            // next capture immediately.
            if let Some(remaining) = self.frame_interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        self.phase = LoopPhase::ShuttingDown;
        log::info!("shutdown requested; releasing display and camera");
        // Display released here, classifier and camera on drop — the
        // reverse of acquisition order.
        self.display = None;
        log::info!("pilot loop stopped after {} iterations", self.iterations);
    }
}

/// Exponentially weighted frames-per-second estimate for the overlay.
struct FpsTracker {
    last_tick: Option<Instant>,
    ema_interval_s: f32,
}

impl FpsTracker {
    fn new() -> Self {
        Self {
            last_tick: None,
            ema_interval_s: 0.0,
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick {
            let dt = now.duration_since(last).as_secs_f32();
            self.ema_interval_s = if self.ema_interval_s == 0.0 {
                dt
            } else {
                self.ema_interval_s * 0.9 + dt * 0.1
            };
        }
        self.last_tick = Some(now);
    }

    fn fps(&self) -> f32 {
        if self.ema_interval_s > 0.0 {
            1.0 / self.ema_interval_s
        } else {
            0.0
        }
    }
}
