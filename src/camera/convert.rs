//! Color-space conversion to RGBA.
//!
//! Device frames arrive as RGBA, RGB, packed YUYV or planar NV12; the
//! classifier contract only accepts RGBA8. Conversion failures are
//! per-frame: the caller drops the frame and captures a fresh one rather
//! than feeding partially-converted data downstream.

use anyhow::{anyhow, Result};

use crate::frame::{PixelFormat, RawFrame, RgbaFrame};

/// Convert a captured frame to interleaved RGBA8.
pub fn to_rgba(frame: &RawFrame) -> Result<RgbaFrame> {
    let width = frame.width;
    let height = frame.height;
    let pixels = frame.data();

    let data = match frame.format {
        PixelFormat::Rgba8 => {
            let expected = checked_frame_len(width, height, 4)?;
            if pixels.len() != expected {
                return Err(anyhow!(
                    "RGBA frame length mismatch: expected {}, got {}",
                    expected,
                    pixels.len()
                ));
            }
            pixels.to_vec()
        }
        PixelFormat::Rgb24 => rgb_to_rgba(pixels, width, height)?,
        PixelFormat::Yuyv => yuyv_to_rgba(pixels, width, height)?,
        PixelFormat::Nv12 => nv12_to_rgba(pixels, width, height)?,
    };

    Ok(RgbaFrame::new(data, width, height))
}

fn checked_frame_len(width: u32, height: u32, bytes_per_pixel: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(bytes_per_pixel))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

fn rgb_to_rgba(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = checked_frame_len(width, height, 3)?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "RGB frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgba = Vec::with_capacity(expected / 3 * 4);
    for rgb in pixels.chunks_exact(3) {
        rgba.extend_from_slice(rgb);
        rgba.push(255);
    }
    Ok(rgba)
}

fn yuyv_to_rgba(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = checked_frame_len(width, height, 2)?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "YUYV frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }
    if width % 2 != 0 {
        return Err(anyhow!("YUYV requires an even frame width, got {}", width));
    }

    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for pair in pixels.chunks_exact(4) {
        let u = pair[1] as f32 - 128.0;
        let v = pair[3] as f32 - 128.0;
        push_yuv_pixel(&mut rgba, pair[0] as f32, u, v);
        push_yuv_pixel(&mut rgba, pair[2] as f32, u, v);
    }
    Ok(rgba)
}

fn nv12_to_rgba(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let w = width as usize;
    let h = height as usize;
    let y_plane = w
        .checked_mul(h)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    let expected = y_plane
        .checked_add(y_plane / 2)
        .ok_or_else(|| anyhow!("NV12 frame dimensions overflow"))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "NV12 frame length mismatch: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgba = Vec::with_capacity(y_plane * 4);
    for j in 0..h {
        for i in 0..w {
            let y = pixels[j * w + i] as f32;
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;
            push_yuv_pixel(&mut rgba, y, u, v);
        }
    }
    Ok(rgba)
}

fn push_yuv_pixel(rgba: &mut Vec<u8>, y: f32, u: f32, v: f32) {
    let r = y + 1.402_f32 * v;
    let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
    let b = y + 1.772_f32 * u;
    rgba.push(clamp_to_u8(r));
    rgba.push(clamp_to_u8(g));
    rgba.push(clamp_to_u8(b));
    rgba.push(255);
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_passes_through() -> Result<()> {
        let pixels = vec![9u8; 2 * 2 * 4];
        let frame = RawFrame::new(pixels.clone(), 2, 2, PixelFormat::Rgba8);
        let rgba = to_rgba(&frame)?;
        assert_eq!(rgba.pixels(), &pixels[..]);
        Ok(())
    }

    #[test]
    fn rgb_gains_opaque_alpha() -> Result<()> {
        let frame = RawFrame::new(vec![10, 20, 30], 1, 1, PixelFormat::Rgb24);
        let rgba = to_rgba(&frame)?;
        assert_eq!(rgba.pixels(), &[10, 20, 30, 255]);
        Ok(())
    }

    #[test]
    fn nv12_gray_converts_to_gray() -> Result<()> {
        let y_plane = vec![128u8; 4];
        let uv_plane = vec![128u8; 2];
        let frame = RawFrame::new([y_plane, uv_plane].concat(), 2, 2, PixelFormat::Nv12);

        let rgba = to_rgba(&frame)?;
        let expected: Vec<u8> = (0..4).flat_map(|_| [128, 128, 128, 255]).collect();
        assert_eq!(rgba.pixels(), &expected[..]);
        Ok(())
    }

    #[test]
    fn yuyv_gray_converts_to_gray() -> Result<()> {
        let frame = RawFrame::new(vec![128, 128, 128, 128], 2, 1, PixelFormat::Yuyv);
        let rgba = to_rgba(&frame)?;
        assert_eq!(rgba.pixels(), &[128, 128, 128, 255, 128, 128, 128, 255]);
        Ok(())
    }

    #[test]
    fn truncated_frames_are_rejected() {
        let frame = RawFrame::new(vec![0u8; 5], 2, 2, PixelFormat::Yuyv);
        assert!(to_rgba(&frame).is_err());

        let frame = RawFrame::new(vec![0u8; 7], 2, 2, PixelFormat::Nv12);
        assert!(to_rgba(&frame).is_err());

        let frame = RawFrame::new(vec![0u8; 11], 2, 2, PixelFormat::Rgb24);
        assert!(to_rgba(&frame).is_err());
    }
}
