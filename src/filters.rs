//! Continuous image adjustments: brightness/contrast/saturation color pass,
//! gaussian blur, and a rotate+flip resample, composed in one pipeline over
//! the original buffer. Every function is pure: the input buffer is never
//! mutated, each stage returns a new buffer.

use anyhow::{Result, anyhow};

use crate::image_processing::{BYTES_PER_PIXEL, check_buffer};

/// Adjustment parameters. Percent values default to 100 (no change), blur to
/// 0 px, rotation to 0 degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Adjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub blur: f32,
    pub rotation: f32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            rotation: 0.0,
            flip_horizontal: false,
            flip_vertical: false,
        }
    }
}

impl Adjustments {
    pub fn validate(&self) -> Result<()> {
        check_range("brightness", self.brightness, 0.0, 200.0)?;
        check_range("contrast", self.contrast, 0.0, 200.0)?;
        check_range("saturation", self.saturation, 0.0, 200.0)?;
        check_range("blur", self.blur, 0.0, 10.0)?;
        check_range("rotation", self.rotation, -360.0, 360.0)?;
        Ok(())
    }

    fn touches_color(&self) -> bool {
        self.brightness != 100.0 || self.contrast != 100.0 || self.saturation != 100.0
    }

    fn touches_geometry(&self) -> bool {
        self.rotation != 0.0 || self.flip_horizontal || self.flip_vertical
    }
}

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(anyhow!("{name} must be within [{min}, {max}], got {value}"));
    }
    Ok(())
}

/// Applies the full adjustment pipeline to an RGBA buffer. Output dimensions
/// equal the input dimensions; rotation happens within the fixed canvas, so
/// corners that leave the frame are clipped and uncovered pixels come out
/// transparent.
pub fn apply_adjustments(
    pixels: &[u8],
    width: u32,
    height: u32,
    adjustments: &Adjustments,
) -> Result<Vec<u8>> {
    adjustments.validate()?;
    check_buffer(pixels, width, height)?;

    let mut current = if adjustments.touches_color() {
        color_pass(pixels, adjustments)
    } else {
        pixels.to_vec()
    };
    if adjustments.blur > 0.0 {
        current = gaussian_blur(&current, width, height, adjustments.blur);
    }
    if adjustments.touches_geometry() {
        current = rotate_flip(
            &current,
            width,
            height,
            adjustments.rotation,
            adjustments.flip_horizontal,
            adjustments.flip_vertical,
        );
    }
    Ok(current)
}

/// Brightness, contrast, and saturation in declaration order, per pixel.
/// Contrast pivots at 128; saturation lerps each channel from its luminance.
/// Alpha is untouched.
fn color_pass(pixels: &[u8], adjustments: &Adjustments) -> Vec<u8> {
    let brightness = adjustments.brightness / 100.0;
    let contrast = adjustments.contrast / 100.0;
    let saturation = adjustments.saturation / 100.0;

    let mut output = pixels.to_vec();
    for px in output.chunks_exact_mut(BYTES_PER_PIXEL) {
        let mut r = px[0] as f32 * brightness;
        let mut g = px[1] as f32 * brightness;
        let mut b = px[2] as f32 * brightness;

        r = (r - 128.0) * contrast + 128.0;
        g = (g - 128.0) * contrast + 128.0;
        b = (b - 128.0) * contrast + 128.0;

        let luminance = 0.299 * r + 0.587 * g + 0.114 * b;
        r = luminance + (r - luminance) * saturation;
        g = luminance + (g - luminance) * saturation;
        b = luminance + (b - luminance) * saturation;

        px[0] = r.round().clamp(0.0, 255.0) as u8;
        px[1] = g.round().clamp(0.0, 255.0) as u8;
        px[2] = b.round().clamp(0.0, 255.0) as u8;
    }
    output
}

/// Separable gaussian blur with edge clamp. `radius` is the standard
/// deviation in pixels; the kernel extends three deviations each side.
fn gaussian_blur(pixels: &[u8], width: u32, height: u32, radius: f32) -> Vec<u8> {
    let kernel = gaussian_kernel(radius);
    let mut tmp = vec![0u8; pixels.len()];
    let mut out = vec![0u8; pixels.len()];
    horizontal_pass(pixels, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    out
}

fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let half = (sigma * 3.0).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut weights = Vec::with_capacity((2 * half + 1) as usize);
    let mut sum = 0.0f32;
    for i in -half..=half {
        let x = i as f32;
        let w = (-x * x / denom).exp();
        weights.push(w);
        sum += w;
    }
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[f32]) {
    let half = (kernel.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kw) in kernel.iter().enumerate() {
                let sx = (x + ki as i32 - half).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * BYTES_PER_PIXEL;
                for c in 0..BYTES_PER_PIXEL {
                    acc[c] += kw * src[idx + c] as f32;
                }
            }
            let out_idx = ((y * w + x) as usize) * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                dst[out_idx + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, kernel: &[f32]) {
    let half = (kernel.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0.0f32; 4];
            for (ki, &kw) in kernel.iter().enumerate() {
                let sy = (y + ki as i32 - half).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * BYTES_PER_PIXEL;
                for c in 0..BYTES_PER_PIXEL {
                    acc[c] += kw * src[idx + c] as f32;
                }
            }
            let out_idx = ((y * w + x) as usize) * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                dst[out_idx + c] = acc[c].round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

/// Rotate about the image center and flip, by inverse-mapping each output
/// pixel to its source position (nearest neighbor). The forward transform is
/// translate(center) * rotate(angle) * flip * translate(-center), matching a
/// canvas redraw through that matrix.
fn rotate_flip(
    src: &[u8],
    width: u32,
    height: u32,
    degrees: f32,
    flip_h: bool,
    flip_v: bool,
) -> Vec<u8> {
    let mut out = vec![0u8; src.len()];
    let theta = degrees.to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let w = width as i32;
    let h = height as i32;

    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            // inverse rotation, then inverse flip (a flip is its own inverse)
            let mut sx = dx * cos + dy * sin;
            let mut sy = -dx * sin + dy * cos;
            if flip_h {
                sx = -sx;
            }
            if flip_v {
                sy = -sy;
            }
            let src_x = (sx + cx).floor() as i32;
            let src_y = (sy + cy).floor() as i32;
            if src_x < 0 || src_x >= w || src_y < 0 || src_y >= h {
                continue;
            }
            let src_idx = ((src_y * w + src_x) as usize) * BYTES_PER_PIXEL;
            let dst_idx = ((y * w + x) as usize) * BYTES_PER_PIXEL;
            out[dst_idx..dst_idx + BYTES_PER_PIXEL]
                .copy_from_slice(&src[src_idx..src_idx + BYTES_PER_PIXEL]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(width: u32, height: u32) -> Vec<u8> {
        let mut buf = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let idx = (y * width as usize + x) * BYTES_PER_PIXEL;
                let v = if (x + y) % 2 == 0 { 200 } else { 40 };
                buf[idx] = v;
                buf[idx + 1] = v;
                buf[idx + 2] = v;
                buf[idx + 3] = 255;
            }
        }
        buf
    }

    #[test]
    fn default_adjustments_are_identity() {
        let src = checkerboard(4, 3);
        let out = apply_adjustments(&src, 4, 3, &Adjustments::default()).unwrap();
        assert_eq!(src, out);
    }

    #[test]
    fn zero_brightness_blacks_out_color_channels() {
        let src = checkerboard(2, 2);
        let adjustments = Adjustments {
            brightness: 0.0,
            contrast: 100.0,
            ..Adjustments::default()
        };
        let out = apply_adjustments(&src, 2, 2, &adjustments).unwrap();
        for px in out.chunks_exact(BYTES_PER_PIXEL) {
            assert_eq!(&px[0..3], &[0, 0, 0]);
            assert_eq!(px[3], 255);
        }
    }

    #[test]
    fn zero_saturation_equalizes_channels() {
        let mut src = vec![0u8; 4];
        src[0] = 180;
        src[1] = 60;
        src[2] = 20;
        src[3] = 255;
        let adjustments = Adjustments {
            saturation: 0.0,
            ..Adjustments::default()
        };
        let out = apply_adjustments(&src, 1, 1, &adjustments).unwrap();
        assert_eq!(out[0], out[1]);
        assert_eq!(out[1], out[2]);
        assert_eq!(out[3], 255);
    }

    #[test]
    fn rotation_180_reverses_pixel_order() {
        let mut src = vec![0u8; 2 * BYTES_PER_PIXEL];
        src[0] = 10;
        src[3] = 255;
        src[4] = 250;
        src[7] = 255;
        let adjustments = Adjustments {
            rotation: 180.0,
            ..Adjustments::default()
        };
        let out = apply_adjustments(&src, 2, 1, &adjustments).unwrap();
        assert_eq!(out[0], 250);
        assert_eq!(out[4], 10);
    }

    #[test]
    fn horizontal_flip_mirrors_row() {
        let mut src = vec![0u8; 3 * BYTES_PER_PIXEL];
        for (i, v) in [10u8, 20, 30].iter().enumerate() {
            src[i * BYTES_PER_PIXEL] = *v;
            src[i * BYTES_PER_PIXEL + 3] = 255;
        }
        let adjustments = Adjustments {
            flip_horizontal: true,
            ..Adjustments::default()
        };
        let out = apply_adjustments(&src, 3, 1, &adjustments).unwrap();
        assert_eq!(out[0], 30);
        assert_eq!(out[BYTES_PER_PIXEL], 20);
        assert_eq!(out[2 * BYTES_PER_PIXEL], 10);
    }

    #[test]
    fn blur_preserves_constant_regions() {
        let src = vec![128u8; 4 * 4 * BYTES_PER_PIXEL];
        let adjustments = Adjustments {
            blur: 2.0,
            ..Adjustments::default()
        };
        let out = apply_adjustments(&src, 4, 4, &adjustments).unwrap();
        assert_eq!(src, out);
    }

    #[test]
    fn out_of_domain_parameters_are_rejected() {
        let src = checkerboard(2, 2);
        for bad in [
            Adjustments {
                brightness: 250.0,
                ..Adjustments::default()
            },
            Adjustments {
                blur: 10.5,
                ..Adjustments::default()
            },
            Adjustments {
                rotation: 400.0,
                ..Adjustments::default()
            },
            Adjustments {
                contrast: -1.0,
                ..Adjustments::default()
            },
        ] {
            assert!(apply_adjustments(&src, 2, 2, &bad).is_err());
        }
    }
}
