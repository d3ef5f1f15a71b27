//! One-shot pixel effects. Each effect consumes whatever the buffer
//! currently holds and returns a new buffer, so repeated application
//! compounds; recovering the original means keeping a reference to it.

use anyhow::Result;
use rmcp::schemars::JsonSchema;
use serde::Deserialize;

use crate::image_processing::{BYTES_PER_PIXEL, check_buffer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Grayscale,
    Sepia,
    Invert,
    Vintage,
    Sharpen,
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Grayscale => "grayscale",
            Effect::Sepia => "sepia",
            Effect::Invert => "invert",
            Effect::Vintage => "vintage",
            Effect::Sharpen => "sharpen",
        }
    }
}

pub fn apply_effect(pixels: &[u8], width: u32, height: u32, effect: Effect) -> Result<Vec<u8>> {
    check_buffer(pixels, width, height)?;
    Ok(match effect {
        Effect::Grayscale => map_rgb(pixels, |r, g, b| {
            let l = luminance(r, g, b);
            (l, l, l)
        }),
        Effect::Sepia => map_rgb(pixels, |r, g, b| {
            let (r, g, b) = (r as f32, g as f32, b as f32);
            (
                clamp_channel(0.393 * r + 0.769 * g + 0.189 * b),
                clamp_channel(0.349 * r + 0.686 * g + 0.168 * b),
                clamp_channel(0.272 * r + 0.534 * g + 0.131 * b),
            )
        }),
        Effect::Invert => map_rgb(pixels, |r, g, b| (255 - r, 255 - g, 255 - b)),
        Effect::Vintage => map_rgb(pixels, |r, g, b| {
            (
                clamp_channel(1.2 * r as f32 + 30.0),
                clamp_channel(0.9 * g as f32 + 20.0),
                clamp_channel(0.7 * b as f32 + 10.0),
            )
        }),
        Effect::Sharpen => sharpen(pixels, width, height),
    })
}

/// Naive background removal: a pixel whose luminance is above 240 or below
/// 15 becomes fully transparent, everything else is kept. A global
/// threshold with no edge awareness; near-white or near-black subject
/// regions are misclassified.
pub fn remove_background(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_buffer(pixels, width, height)?;
    let mut output = pixels.to_vec();
    for px in output.chunks_exact_mut(BYTES_PER_PIXEL) {
        // luminance in 1/1000 units keeps the strict boundary comparison
        // exact at 240 and 15
        let milli =
            299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
        if milli > 240_000 || milli < 15_000 {
            px[3] = 0;
        }
    }
    Ok(output)
}

fn luminance(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
}

fn clamp_channel(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn map_rgb(pixels: &[u8], f: impl Fn(u8, u8, u8) -> (u8, u8, u8)) -> Vec<u8> {
    let mut output = pixels.to_vec();
    for px in output.chunks_exact_mut(BYTES_PER_PIXEL) {
        let (r, g, b) = f(px[0], px[1], px[2]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
    output
}

/// 3x3 convolution with kernel [[0,-1,0],[-1,5,-1],[0,-1,0]], per RGB
/// channel over interior pixels. The outer 1-pixel border is copied through
/// unmodified; alpha is copied everywhere.
fn sharpen(pixels: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut output = pixels.to_vec();
    if width < 3 || height < 3 {
        return output;
    }
    let w = width as usize;
    for y in 1..height as usize - 1 {
        for x in 1..w - 1 {
            let idx = (y * w + x) * BYTES_PER_PIXEL;
            for c in 0..3 {
                let center = pixels[idx + c] as i32;
                let up = pixels[idx - w * BYTES_PER_PIXEL + c] as i32;
                let down = pixels[idx + w * BYTES_PER_PIXEL + c] as i32;
                let left = pixels[idx - BYTES_PER_PIXEL + c] as i32;
                let right = pixels[idx + BYTES_PER_PIXEL + c] as i32;
                let value = 5 * center - up - down - left - right;
                output[idx + c] = value.clamp(0, 255) as u8;
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        let mut buf = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
        for (i, px) in buf.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            px[0] = (i * 11 % 256) as u8;
            px[1] = (i * 29 % 256) as u8;
            px[2] = (i * 47 % 256) as u8;
            px[3] = 255;
        }
        buf
    }

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        rgba.repeat(width as usize * height as usize)
    }

    #[test]
    fn invert_twice_is_identity() {
        let src = gradient(5, 4);
        let once = apply_effect(&src, 5, 4, Effect::Invert).unwrap();
        let twice = apply_effect(&once, 5, 4, Effect::Invert).unwrap();
        assert_eq!(src, twice);
    }

    #[test]
    fn grayscale_is_idempotent() {
        let src = gradient(5, 4);
        let once = apply_effect(&src, 5, 4, Effect::Grayscale).unwrap();
        let twice = apply_effect(&once, 5, 4, Effect::Grayscale).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn grayscale_equalizes_channels() {
        let out = apply_effect(&gradient(3, 3), 3, 3, Effect::Grayscale).unwrap();
        for px in out.chunks_exact(BYTES_PER_PIXEL) {
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn sepia_saturates_on_white() {
        let out = apply_effect(&solid(1, 1, [255, 255, 255, 255]), 1, 1, Effect::Sepia).unwrap();
        // all three weighted sums exceed 255 and clamp
        assert_eq!(&out[0..3], &[255, 255, 239]);
    }

    #[test]
    fn vintage_transform_on_midtone() {
        let out = apply_effect(&solid(1, 1, [100, 100, 100, 255]), 1, 1, Effect::Vintage).unwrap();
        assert_eq!(&out[0..3], &[150, 110, 80]);
    }

    #[test]
    fn sharpen_leaves_border_untouched() {
        let src = gradient(5, 5);
        let out = apply_effect(&src, 5, 5, Effect::Sharpen).unwrap();
        for y in 0..5usize {
            for x in 0..5usize {
                if x == 0 || y == 0 || x == 4 || y == 4 {
                    let idx = (y * 5 + x) * BYTES_PER_PIXEL;
                    assert_eq!(
                        &src[idx..idx + BYTES_PER_PIXEL],
                        &out[idx..idx + BYTES_PER_PIXEL]
                    );
                }
            }
        }
    }

    #[test]
    fn sharpen_keeps_flat_regions_flat() {
        let src = solid(5, 5, [90, 90, 90, 255]);
        let out = apply_effect(&src, 5, 5, Effect::Sharpen).unwrap();
        assert_eq!(src, out);
    }

    #[test]
    fn effects_do_not_mutate_input() {
        let src = gradient(4, 4);
        let copy = src.clone();
        let _ = apply_effect(&src, 4, 4, Effect::Sepia).unwrap();
        let _ = remove_background(&src, 4, 4).unwrap();
        assert_eq!(src, copy);
    }

    #[test]
    fn background_removal_threshold_boundaries() {
        // gray pixels: luminance equals the channel value
        let cases = [(240u8, 255u8), (241, 0), (15, 255), (14, 0)];
        for (value, expected_alpha) in cases {
            let src = solid(1, 1, [value, value, value, 255]);
            let out = remove_background(&src, 1, 1).unwrap();
            assert_eq!(out[3], expected_alpha, "luminance {value}");
            assert_eq!(&out[0..3], &src[0..3]);
        }
    }

    #[test]
    fn background_removal_clears_all_white_image() {
        let src = solid(4, 4, [255, 255, 255, 255]);
        let out = remove_background(&src, 4, 4).unwrap();
        for px in out.chunks_exact(BYTES_PER_PIXEL) {
            assert_eq!(px[3], 0);
        }
    }
}
