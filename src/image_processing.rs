use anyhow::{Result, anyhow};
use image::{DynamicImage, ImageFormat, RgbaImage};

pub const BYTES_PER_PIXEL: usize = 4;

/// Length in bytes of an RGBA buffer for the given dimensions, or an error
/// when the multiplication overflows.
pub fn expected_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(BYTES_PER_PIXEL))
        .ok_or_else(|| anyhow!("pixel buffer size overflow: {width}x{height}"))
}

pub fn check_buffer(pixels: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = expected_len(width, height)?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "pixel buffer length {} does not match {width}x{height} rgba",
            pixels.len()
        ));
    }
    Ok(())
}

/// Side of the centered square crop.
pub fn square_side(width: u32, height: u32) -> u32 {
    width.min(height)
}

/// Centered square crop: returns the `min(w,h)` square sub-rectangle of the
/// input buffer. Pure; the input is left untouched.
pub fn crop_square_pixels(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_buffer(pixels, width, height)?;
    let side = square_side(width, height);
    if side == 0 {
        return Ok(Vec::new());
    }
    let start_x = (width - side) / 2;
    let start_y = (height - side) / 2;

    let mut output = vec![0u8; (side as usize) * (side as usize) * BYTES_PER_PIXEL];
    for y in 0..side {
        let src_row =
            ((start_y + y) as usize * width as usize + start_x as usize) * BYTES_PER_PIXEL;
        let dst_row = y as usize * side as usize * BYTES_PER_PIXEL;
        let row_len = side as usize * BYTES_PER_PIXEL;
        output[dst_row..dst_row + row_len].copy_from_slice(&pixels[src_row..src_row + row_len]);
    }
    Ok(output)
}

pub fn decode_image(bytes: &[u8], mime_type: &str) -> Result<(Vec<u8>, u32, u32)> {
    let format = mime_to_format(mime_type)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|err| anyhow!("decode image failed: {err}"))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok((image.into_raw(), width, height))
}

pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let rgba = RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| anyhow!("invalid rgba buffer"))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|err| anyhow!("encode png failed: {err}"))?;
    Ok(output)
}

/// JPEG has no alpha channel, so the buffer is flattened to RGB first.
pub fn encode_jpeg(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let rgba = RgbaImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| anyhow!("invalid rgba buffer"))?;
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Jpeg)
        .map_err(|err| anyhow!("encode jpeg failed: {err}"))?;
    Ok(output)
}

pub fn detect_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if bytes.starts_with(b"BM") {
        return Some("image/bmp");
    }
    if bytes.starts_with(b"%PDF-") {
        return Some("application/pdf");
    }
    None
}

pub fn mime_to_format(mime_type: &str) -> Result<ImageFormat> {
    match mime_type {
        "image/png" => Ok(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Ok(ImageFormat::Jpeg),
        "image/gif" => Ok(ImageFormat::Gif),
        "image/webp" => Ok(ImageFormat::WebP),
        "image/bmp" => Ok(ImageFormat::Bmp),
        _ => Err(anyhow!("unsupported mime type: {mime_type}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32) -> Vec<u8> {
        let mut buf = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
        for (i, px) in buf.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            px[0] = (i % 256) as u8;
            px[1] = ((i * 7) % 256) as u8;
            px[2] = ((i * 13) % 256) as u8;
            px[3] = 255;
        }
        buf
    }

    #[test]
    fn crop_square_dimensions() {
        let src = filled(6, 4);
        let out = crop_square_pixels(&src, 6, 4).unwrap();
        assert_eq!(out.len(), 4 * 4 * BYTES_PER_PIXEL);
    }

    #[test]
    fn crop_square_is_centered_subrect() {
        let src = filled(6, 4);
        let out = crop_square_pixels(&src, 6, 4).unwrap();
        // side 4, start_x = 1, start_y = 0
        for y in 0..4usize {
            for x in 0..4usize {
                let src_idx = (y * 6 + (x + 1)) * BYTES_PER_PIXEL;
                let dst_idx = (y * 4 + x) * BYTES_PER_PIXEL;
                assert_eq!(
                    &src[src_idx..src_idx + BYTES_PER_PIXEL],
                    &out[dst_idx..dst_idx + BYTES_PER_PIXEL]
                );
            }
        }
    }

    #[test]
    fn crop_square_noop_on_square_input() {
        let src = filled(5, 5);
        let out = crop_square_pixels(&src, 5, 5).unwrap();
        assert_eq!(src, out);
    }

    #[test]
    fn buffer_length_mismatch_is_rejected() {
        assert!(crop_square_pixels(&[0u8; 7], 2, 2).is_err());
    }

    #[test]
    fn png_round_trip_keeps_dimensions() {
        let src = filled(3, 2);
        let png = encode_png(&src, 3, 2).unwrap();
        assert_eq!(detect_mime_type(&png), Some("image/png"));
        let (pixels, w, h) = decode_image(&png, "image/png").unwrap();
        assert_eq!((w, h), (3, 2));
        assert_eq!(pixels, src);
    }

    #[test]
    fn pdf_magic_is_detected() {
        assert_eq!(detect_mime_type(b"%PDF-1.7 ..."), Some("application/pdf"));
    }
}
