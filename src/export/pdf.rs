//! Single-page PDF wrapping a rasterized chart.
//!
//! The page is A4 portrait. The chart image sits at a fixed placement,
//! 10mm from the left and top edges, 190mm wide and 100mm tall. Below it the
//! page lists the title and every point as `label: value`.

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use time::OffsetDateTime;
use time::macros::format_description;

use super::ExportError;
use super::raster::RasterImage;
use crate::chart::ChartSeries;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;

/// Chart placement on the page, in millimetres from the top-left corner.
pub const IMAGE_X_MM: f32 = 10.0;
pub const IMAGE_Y_MM: f32 = 10.0;
pub const IMAGE_WIDTH_MM: f32 = 190.0;
pub const IMAGE_HEIGHT_MM: f32 = 100.0;

const TITLE_SIZE: i64 = 14;
const BODY_SIZE: i64 = 10;
const LINE_GAP: f32 = 14.0;
const BOTTOM_MARGIN: f32 = 40.0;

fn mm(value: f32) -> f32 {
    value * POINTS_PER_MM
}

/// Builds the PDF bytes for `image`, listing the points of `series` beneath it.
///
/// # Errors
///
/// Returns `ExportError::Pdf` if the page content cannot be encoded or the
/// document cannot be serialized.
pub fn single_page_document(image: &RasterImage, series: &ChartSeries) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width()),
            "Height" => i64::from(image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.pixels().to_vec(),
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
        "XObject" => dictionary! { "Im1" => image_id },
    });

    let content = Content {
        operations: page_operations(series),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), mm(PAGE_WIDTH_MM).into(), mm(PAGE_HEIGHT_MM).into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut info = dictionary! {
        "Title" => Object::string_literal(series.title()),
        "Producer" => Object::string_literal(concat!("tagscope ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(date) = creation_date() {
        info.set("CreationDate", Object::string_literal(date));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(lopdf::Error::from)?;
    Ok(buffer)
}

/// Content stream: the placed image, then the title and `label: value` lines.
fn page_operations(series: &ChartSeries) -> Vec<Operation> {
    let image_bottom = mm(PAGE_HEIGHT_MM) - mm(IMAGE_Y_MM + IMAGE_HEIGHT_MM);
    let left = mm(IMAGE_X_MM);

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                mm(IMAGE_WIDTH_MM).into(),
                0.into(),
                0.into(),
                mm(IMAGE_HEIGHT_MM).into(),
                left.into(),
                image_bottom.into(),
            ],
        ),
        Operation::new("Do", vec![Object::Name(b"Im1".to_vec())]),
        Operation::new("Q", vec![]),
    ];

    let mut y = image_bottom - 2.0 * LINE_GAP;
    ops.extend(text_line(series.title(), left, y, TITLE_SIZE));

    let points = series.points();
    for (shown, point) in points.iter().enumerate() {
        y -= LINE_GAP;
        if y < BOTTOM_MARGIN {
            let rest = format!("... and {} more", points.len() - shown);
            ops.extend(text_line(&rest, left, y, BODY_SIZE));
            break;
        }
        ops.extend(text_line(&point.tooltip(), left, y, BODY_SIZE));
    }

    ops
}

fn text_line(text: &str, x: f32, y: f32, size: i64) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(to_latin(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// The standard Helvetica font only covers Latin text; anything else shows as `?`.
fn to_latin(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn creation_date() -> Option<String> {
    let format = format_description!("D:[year][month][day][hour][minute][second]Z");
    OffsetDateTime::now_utc().format(&format).ok()
}
