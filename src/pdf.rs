use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{AlignError, Result};

/// A registered page compressed to JPEG, plus its pixel dimensions.
#[derive(Debug)]
pub struct JpegPage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

const POINTS_PER_INCH: f32 = 72.0;

fn encoding_error(e: impl std::fmt::Display) -> AlignError {
    AlignError::Encoding(e.to_string())
}

/// Pack the ordered JPEG pages into a single PDF, one page per image.
///
/// Each JPEG is embedded as-is in a DCTDecode image XObject drawn over the
/// full page, whose size in points is derived from the pixel dimensions at
/// `dpi`. An empty input produces a valid zero-page document.
pub fn encode_document(pages: &[JpegPage], dpi: u32) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.width as i64,
                "Height" => page.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.data.clone(),
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let page_w = page.width as f32 / dpi as f32 * POINTS_PER_INCH;
        let page_h = page.height as f32 / dpi as f32 * POINTS_PER_INCH;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.0_f32.into(),
                        0.0_f32.into(),
                        page_h.into(),
                        0.0_f32.into(),
                        0.0_f32.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(encoding_error)?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.0_f32.into(), 0.0_f32.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    Ok(doc)
}

/// Write the assembled document to `path`.
pub fn write_document(mut doc: Document, path: &Path) -> Result<()> {
    doc.save(path).map_err(encoding_error)?;
    Ok(())
}
