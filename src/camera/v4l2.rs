//! Camera frame source.
//!
//! `CameraSource` captures raw frames from a local V4L2 device (feature:
//! ingest-v4l2), with a synthetic fallback for `stub://` device paths that
//! is always compiled in.
//!
//! Capture is a bounded wait: `capture` returns `Ok(None)` when no frame
//! arrived within the timeout, and the caller retries on the next loop
//! iteration instead of terminating.

use std::time::Duration;

use anyhow::Result;
#[cfg(not(feature = "ingest-v4l2"))]
use anyhow::bail;

use crate::frame::{PixelFormat, RawFrame};

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0"), or a `stub://` synthetic source.
    pub device: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://camera".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "ingest-v4l2")]
    Device(DeviceCamera),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)?),
            })
        } else {
            #[cfg(feature = "ingest-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::Device(DeviceCamera::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-v4l2"))]
            {
                bail!("device capture requires the ingest-v4l2 feature")
            }
        }
    }

    /// Open the device and start streaming.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.connect(),
        }
    }

    /// Capture the next frame, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when the wait expired without a frame. Device
    /// faults are `Err`; both are non-fatal to the frame loop.
    pub fn capture(&mut self, timeout: Duration) -> Result<Option<RawFrame>> {
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.capture(timeout),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.capture(timeout),
        }
    }

    /// Active frame width in pixels.
    pub fn width(&self) -> u32 {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.config.width,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.active_width,
        }
    }

    /// Active frame height in pixels.
    pub fn height(&self) -> u32 {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.config.height,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.active_height,
        }
    }

    /// Pixel depth of captured frames, in bits per pixel.
    pub fn pixel_depth_bits(&self) -> u32 {
        self.pixel_format().bits_per_pixel()
    }

    /// Wire format of captured frames.
    pub fn pixel_format(&self) -> PixelFormat {
        match &self.backend {
            CameraBackend::Synthetic(_) => PixelFormat::Yuyv,
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.active_format,
        }
    }

    /// Get capture statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(camera) => camera.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(camera) => camera.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub timeouts: u64,
    pub device: String,
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    attempts: u64,
    timeouts: u64,
    /// Simulated "scene" state so consecutive frames differ occasionally.
    scene_state: u8,
    /// Every Nth capture attempt reports a timeout (0 = never).
    timeout_every: u64,
    /// Every Nth produced frame is truncated by one byte (0 = never), to
    /// exercise the conversion-failure path downstream.
    truncate_every: u64,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Result<Self> {
        let (timeout_every, truncate_every) = parse_stub_options(&config.device)?;
        Ok(Self {
            config,
            frame_count: 0,
            attempts: 0,
            timeouts: 0,
            scene_state: 0,
            timeout_every,
            truncate_every,
        })
    }

    /// Synthetic cameras are always "connected".
    fn connect(&mut self) -> Result<()> {
        log::info!("CameraSource: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn capture(&mut self, _timeout: Duration) -> Result<Option<RawFrame>> {
        self.attempts += 1;
        if self.timeout_every > 0 && self.attempts % self.timeout_every == 0 {
            self.timeouts += 1;
            return Ok(None);
        }

        self.frame_count += 1;
        let mut pixels = self.generate_synthetic_pixels();
        if self.truncate_every > 0 && self.frame_count % self.truncate_every == 0 {
            pixels.pop();
        }

        Ok(Some(RawFrame::new(
            pixels,
            self.config.width,
            self.config.height,
            PixelFormat::Yuyv,
        )))
    }

    /// Generate synthetic YUYV data.
    ///
    /// Simulates a trail scene that drifts occasionally: most frames are a
    /// static gradient, and every 50 frames the scene shifts.
    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let byte_count = (self.config.width * self.config.height * 2) as usize;

        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let mut pixels = vec![0u8; byte_count];
        for (i, byte) in pixels.iter_mut().enumerate() {
            *byte = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }

        pixels
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            timeouts: self.timeouts,
            device: self.config.device.clone(),
        }
    }
}

/// Parse fault-injection options from a `stub://` device path, e.g.
/// `stub://camera?timeout_every=3&truncate_every=5`.
fn parse_stub_options(device: &str) -> Result<(u64, u64)> {
    let mut timeout_every = 0;
    let mut truncate_every = 0;
    let Some((_, query)) = device.split_once('?') else {
        return Ok((0, 0));
    };
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("malformed stub camera option '{}'", pair);
        };
        let value: u64 = value
            .parse()
            .map_err(|_| anyhow::anyhow!("stub camera option '{}' must be an integer", key))?;
        match key {
            "timeout_every" => timeout_every = value,
            "truncate_every" => truncate_every = value,
            other => anyhow::bail!("unknown stub camera option '{}'", other),
        }
    }
    Ok((timeout_every, truncate_every))
}

// ----------------------------------------------------------------------------
// Production camera using libv4l
// ----------------------------------------------------------------------------

#[cfg(feature = "ingest-v4l2")]
struct DeviceCamera {
    config: CameraConfig,
    state: Option<DeviceCameraState>,
    frame_count: u64,
    timeouts: u64,
    last_error: Option<String>,
    active_width: u32,
    active_height: u32,
    active_format: PixelFormat,
}

#[cfg(feature = "ingest-v4l2")]
#[ouroboros::self_referencing]
struct DeviceCameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

#[cfg(feature = "ingest-v4l2")]
impl DeviceCamera {
    fn new(config: CameraConfig) -> Result<Self> {
        Ok(Self {
            active_width: config.width,
            active_height: config.height,
            active_format: PixelFormat::Yuyv,
            config,
            state: None,
            frame_count: 0,
            timeouts: 0,
            last_error: None,
        })
    }

    fn connect(&mut self) -> Result<()> {
        use anyhow::Context;
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"YUYV");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "CameraSource: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;
        self.active_format = fourcc_to_pixel_format(&format.fourcc)?;
        self.last_error = None;

        let state = DeviceCameraStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()
        .map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.state = Some(state);

        log::info!(
            "CameraSource: connected to {} ({}x{}, {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.active_format
        );
        Ok(())
    }

    fn capture(&mut self, _timeout: Duration) -> Result<Option<RawFrame>> {
        use anyhow::Context;
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let result = state.with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()));
        let pixels = match result {
            Ok(pixels) => pixels,
            Err(err)
                if matches!(
                    err.kind(),
                    std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                ) =>
            {
                self.timeouts += 1;
                return Ok(None);
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(anyhow::Error::new(err).context("capture v4l2 frame"));
            }
        };

        self.frame_count += 1;

        Ok(Some(RawFrame::new(
            pixels,
            self.active_width,
            self.active_height,
            self.active_format,
        )))
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            timeouts: self.timeouts,
            device: self.config.device.clone(),
        }
    }
}

#[cfg(feature = "ingest-v4l2")]
fn fourcc_to_pixel_format(fourcc: &v4l::FourCC) -> Result<PixelFormat> {
    match &fourcc.repr {
        b"YUYV" => Ok(PixelFormat::Yuyv),
        b"NV12" => Ok(PixelFormat::Nv12),
        b"RGB3" => Ok(PixelFormat::Rgb24),
        b"AB24" | b"RGBA" => Ok(PixelFormat::Rgba8),
        other => Err(anyhow::anyhow!(
            "unsupported v4l2 pixel format {}",
            String::from_utf8_lossy(other)
        )),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_config(device: &str) -> CameraConfig {
        CameraConfig {
            device: device.to_string(),
            target_fps: 10,
            width: 32,
            height: 24,
        }
    }

    #[test]
    fn synthetic_camera_produces_yuyv_frames() -> Result<()> {
        let mut camera = CameraSource::new(stub_config("stub://test"))?;
        camera.connect()?;

        let frame = camera
            .capture(Duration::from_millis(100))?
            .expect("synthetic frame");
        assert_eq!(frame.width, 32);
        assert_eq!(frame.height, 24);
        assert_eq!(frame.format, PixelFormat::Yuyv);
        assert_eq!(frame.data().len(), 32 * 24 * 2);
        assert_eq!(camera.pixel_depth_bits(), 16);

        Ok(())
    }

    #[test]
    fn consecutive_frames_differ() -> Result<()> {
        let mut camera = CameraSource::new(stub_config("stub://test"))?;
        camera.connect()?;

        let first = camera.capture(Duration::from_millis(100))?.unwrap();
        let second = camera.capture(Duration::from_millis(100))?.unwrap();
        assert_ne!(first.data(), second.data());

        Ok(())
    }

    #[test]
    fn timeout_injection_reports_no_frame() -> Result<()> {
        let mut camera = CameraSource::new(stub_config("stub://flaky?timeout_every=2"))?;
        camera.connect()?;

        assert!(camera.capture(Duration::from_millis(100))?.is_some());
        assert!(camera.capture(Duration::from_millis(100))?.is_none());
        assert!(camera.capture(Duration::from_millis(100))?.is_some());
        assert_eq!(camera.stats().timeouts, 1);

        Ok(())
    }

    #[test]
    fn truncate_injection_produces_short_frames() -> Result<()> {
        let mut camera = CameraSource::new(stub_config("stub://flaky?truncate_every=2"))?;
        camera.connect()?;

        let first = camera.capture(Duration::from_millis(100))?.unwrap();
        assert_eq!(first.data().len(), 32 * 24 * 2);
        let second = camera.capture(Duration::from_millis(100))?.unwrap();
        assert_eq!(second.data().len(), 32 * 24 * 2 - 1);

        Ok(())
    }

    #[test]
    fn unknown_stub_options_are_rejected() {
        assert!(CameraSource::new(stub_config("stub://x?bogus=1")).is_err());
        assert!(CameraSource::new(stub_config("stub://x?timeout_every=abc")).is_err());
    }
}
