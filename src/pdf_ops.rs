//! PDF page operations over `lopdf`: parse a page range, split out a range,
//! merge documents, rotate pages. All inputs and outputs are raw PDF bytes;
//! parse and range failures are validation errors, never panics.

use anyhow::{Result, anyhow};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

/// 1-based inclusive page range, as entered in the suite's "start-end" field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn check_against(&self, total_pages: u32) -> Result<()> {
        if self.end > total_pages {
            return Err(anyhow!(
                "page range {}-{} exceeds document page count {total_pages}",
                self.start,
                self.end
            ));
        }
        Ok(())
    }
}

/// Parses `"start-end"` (1-based, inclusive). Rejects non-numeric bounds,
/// a zero start, and reversed ranges.
pub fn parse_page_range(raw: &str) -> Result<PageRange> {
    let trimmed = raw.trim();
    let (start_raw, end_raw) = trimmed
        .split_once('-')
        .ok_or_else(|| anyhow!("page range must look like \"start-end\", got {raw:?}"))?;
    let start: u32 = start_raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid start page {:?}", start_raw.trim()))?;
    let end: u32 = end_raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid end page {:?}", end_raw.trim()))?;
    if start == 0 {
        return Err(anyhow!("pages are numbered from 1"));
    }
    if end < start {
        return Err(anyhow!("page range end {end} is before start {start}"));
    }
    Ok(PageRange { start, end })
}

fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|err| anyhow!("load pdf failed: {err}"))
}

fn save_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut std::io::Cursor::new(&mut output))
        .map_err(|err| anyhow!("save pdf failed: {err}"))?;
    Ok(output)
}

pub fn page_count(bytes: &[u8]) -> Result<u32> {
    Ok(load(bytes)?.get_pages().len() as u32)
}

/// New document holding only the pages of `range`, in order.
pub fn split_pdf(bytes: &[u8], range: PageRange) -> Result<Vec<u8>> {
    let mut doc = load(bytes)?;
    let total = doc.get_pages().len() as u32;
    range.check_against(total)?;

    let discard: Vec<u32> = (1..=total)
        .filter(|page| *page < range.start || *page > range.end)
        .collect();
    doc.delete_pages(&discard);
    doc.prune_objects();
    save_bytes(&mut doc)
}

/// Concatenates the pages of all inputs in argument order.
pub fn merge_pdfs(inputs: &[Vec<u8>]) -> Result<Vec<u8>> {
    if inputs.len() < 2 {
        return Err(anyhow!("merge requires at least two documents"));
    }

    let mut merged = Document::with_version("1.5");
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut max_id = 1u32;
    for bytes in inputs {
        let mut doc = load(bytes)?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;
        for (_, object_id) in doc.get_pages() {
            page_ids.push(object_id);
        }
        merged.objects.extend(doc.objects);
    }

    let pages_id = (max_id, 0);
    let catalog_id = (max_id + 1, 0);
    for object_id in &page_ids {
        if let Ok(page) = merged
            .get_object_mut(*object_id)
            .and_then(Object::as_dict_mut)
        {
            page.set("Parent", Object::Reference(pages_id));
        }
    }
    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => kids,
        }),
    );
    merged.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        }),
    );
    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = max_id + 1;
    merged.renumber_objects();
    save_bytes(&mut merged)
}

/// A JPEG ready for embedding, with its pixel dimensions.
pub struct PdfImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const PAGE_MARGIN: f32 = 36.0;

/// One letter-size page per image, each drawn top-aligned and centered,
/// scaled down to fit within the margins (never scaled up). The JPEG bytes
/// are embedded as-is via DCTDecode.
pub fn images_to_pdf(images: &[PdfImage]) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(anyhow!("at least one image is required"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for image in images {
        if image.width == 0 || image.height == 0 {
            return Err(anyhow!("image has zero dimension"));
        }
        let xobject_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                image.jpeg.clone(),
            )
            .with_compression(false),
        );

        let max_width = PAGE_WIDTH - 2.0 * PAGE_MARGIN;
        let max_height = PAGE_HEIGHT - 2.0 * PAGE_MARGIN;
        let scale = (max_width / image.width as f32)
            .min(max_height / image.height as f32)
            .min(1.0);
        let draw_width = image.width as f32 * scale;
        let draw_height = image.height as f32 * scale;
        let x = (PAGE_WIDTH - draw_width) / 2.0;
        let y = PAGE_HEIGHT - PAGE_MARGIN - draw_height;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        draw_width.into(),
                        0.into(),
                        0.into(),
                        draw_height.into(),
                        x.into(),
                        y.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|err| anyhow!("encode page content failed: {err}"))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => Object::Reference(xobject_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => images.len() as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    save_bytes(&mut doc)
}

/// Adds `angle` (90, 180 or 270) to every page's /Rotate value, modulo 360.
pub fn rotate_pdf(bytes: &[u8], angle: i64) -> Result<Vec<u8>> {
    if !matches!(angle, 90 | 180 | 270) {
        return Err(anyhow!("rotation angle must be 90, 180 or 270, got {angle}"));
    }
    let mut doc = load(bytes)?;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in pages {
        let current = doc
            .get_object(page_id)
            .and_then(Object::as_dict)
            .ok()
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|object| object.as_i64().ok())
            .unwrap_or(0);
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| anyhow!("page {page_id:?} is not a dictionary: {err}"))?;
        page.set("Rotate", Object::Integer((current + angle).rem_euclid(360)));
    }
    save_bytes(&mut doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing;

    fn sample_pdf(pages: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let content = Content { operations: vec![] };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => pages as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        save_bytes(&mut doc).unwrap()
    }

    #[test]
    fn parse_accepts_plain_range() {
        assert_eq!(
            parse_page_range("2-5").unwrap(),
            PageRange { start: 2, end: 5 }
        );
        assert_eq!(
            parse_page_range(" 1 - 1 ").unwrap(),
            PageRange { start: 1, end: 1 }
        );
    }

    #[test]
    fn parse_rejects_garbage_without_panicking() {
        assert!(parse_page_range("abc-def").is_err());
        assert!(parse_page_range("").is_err());
        assert!(parse_page_range("3").is_err());
        assert!(parse_page_range("0-2").is_err());
        assert!(parse_page_range("5-2").is_err());
    }

    #[test]
    fn range_bounds_checked_against_page_count() {
        let range = parse_page_range("2-9").unwrap();
        assert!(range.check_against(5).is_err());
        assert!(range.check_against(9).is_ok());
    }

    #[test]
    fn split_keeps_only_requested_pages() {
        let source = sample_pdf(5);
        let out = split_pdf(&source, parse_page_range("2-4").unwrap()).unwrap();
        assert_eq!(page_count(&out).unwrap(), 3);
    }

    #[test]
    fn split_out_of_range_fails() {
        let source = sample_pdf(3);
        assert!(split_pdf(&source, parse_page_range("2-7").unwrap()).is_err());
    }

    #[test]
    fn merge_concatenates_page_counts() {
        let a = sample_pdf(2);
        let b = sample_pdf(3);
        let merged = merge_pdfs(&[a, b]).unwrap();
        assert_eq!(page_count(&merged).unwrap(), 5);
    }

    #[test]
    fn merge_requires_two_inputs() {
        assert!(merge_pdfs(&[sample_pdf(1)]).is_err());
    }

    #[test]
    fn rotate_accumulates_modulo_360() {
        let source = sample_pdf(2);
        let once = rotate_pdf(&source, 270).unwrap();
        let twice = rotate_pdf(&once, 180).unwrap();
        let doc = Document::load_mem(&twice).unwrap();
        for (_, page_id) in doc.get_pages() {
            let rotate = doc
                .get_object(page_id)
                .and_then(Object::as_dict)
                .unwrap()
                .get(b"Rotate")
                .and_then(Object::as_i64)
                .unwrap();
            assert_eq!(rotate, 90);
        }
    }

    #[test]
    fn rotate_rejects_odd_angles() {
        assert!(rotate_pdf(&sample_pdf(1), 45).is_err());
    }

    fn sample_jpeg(width: u32, height: u32) -> PdfImage {
        let pixels = vec![200u8; width as usize * height as usize * 4];
        PdfImage {
            jpeg: image_processing::encode_jpeg(&pixels, width, height).unwrap(),
            width,
            height,
        }
    }

    #[test]
    fn images_become_one_page_each() {
        let pdf = images_to_pdf(&[sample_jpeg(8, 8), sample_jpeg(16, 4)]).unwrap();
        assert_eq!(page_count(&pdf).unwrap(), 2);
    }

    #[test]
    fn images_to_pdf_requires_input() {
        assert!(images_to_pdf(&[]).is_err());
    }
}
