use super::xml::{self, Element};
use crate::error::{DocError, Result};

pub const EMU_PER_INCH: f64 = 914_400.0;
/// Pixels are laid out at 96 DPI when no explicit size is requested.
pub const EMU_PER_PIXEL: u64 = 9_525;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Bmp => "BMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

/// Identifies the format and pixel size from the file header.
pub fn read_header(data: &[u8]) -> Option<ImageHeader> {
    if data.len() >= 24 && data.starts_with(&[0x89, b'P', b'N', b'G']) {
        let width_px = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height_px = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        return Some(ImageHeader {
            format: ImageFormat::Png,
            width_px,
            height_px,
        });
    }

    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        return jpeg_header(data);
    }

    if data.len() >= 10 && (data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return Some(ImageHeader {
            format: ImageFormat::Gif,
            width_px: u32::from(u16::from_le_bytes([data[6], data[7]])),
            height_px: u32::from(u16::from_le_bytes([data[8], data[9]])),
        });
    }

    if data.len() >= 26 && data.starts_with(b"BM") {
        let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
        let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
        return Some(ImageHeader {
            format: ImageFormat::Bmp,
            width_px: width.unsigned_abs(),
            height_px: height.unsigned_abs(),
        });
    }

    None
}

fn jpeg_header(data: &[u8]) -> Option<ImageHeader> {
    let mut i = 2;
    while i + 4 < data.len() {
        if data[i] != 0xFF {
            return None;
        }
        let marker = data[i + 1];
        if marker == 0xD9 {
            break;
        }
        let len = usize::from(u16::from_be_bytes([data[i + 2], data[i + 3]]));
        let is_frame = matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF);
        if is_frame && i + 9 < data.len() {
            let height_px = u32::from(u16::from_be_bytes([data[i + 5], data[i + 6]]));
            let width_px = u32::from(u16::from_be_bytes([data[i + 7], data[i + 8]]));
            return Some(ImageHeader {
                format: ImageFormat::Jpeg,
                width_px,
                height_px,
            });
        }
        i += 2 + len;
    }
    None
}

/// Display size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub cx: u64,
    pub cy: u64,
}

impl Extent {
    /// Picks the display size: both dimensions when given, one dimension with
    /// the other following the aspect ratio, or the native size at 96 DPI.
    pub fn fit(header: &ImageHeader, width_in: Option<f64>, height_in: Option<f64>) -> Self {
        let native_cx = u64::from(header.width_px.max(1)) * EMU_PER_PIXEL;
        let native_cy = u64::from(header.height_px.max(1)) * EMU_PER_PIXEL;
        let aspect = native_cy as f64 / native_cx as f64;
        match (width_in, height_in) {
            (Some(width), Some(height)) => Self::from_inches(width, height),
            (Some(width), None) => Self::from_inches(width, width * aspect),
            (None, Some(height)) => Self::from_inches(height / aspect, height),
            (None, None) => Self {
                cx: native_cx,
                cy: native_cy,
            },
        }
    }

    pub fn from_inches(width: f64, height: f64) -> Self {
        Self {
            cx: (width * EMU_PER_INCH).round().max(1.0) as u64,
            cy: (height * EMU_PER_INCH).round().max(1.0) as u64,
        }
    }

    pub fn width_inches(&self) -> f64 {
        self.cx as f64 / EMU_PER_INCH
    }

    pub fn height_inches(&self) -> f64 {
        self.cy as f64 / EMU_PER_INCH
    }

    /// Reads `wp:extent` from a `w:drawing` subtree.
    pub fn read(drawing: &Element) -> Option<Self> {
        let extent = drawing.find_descendant("wp:extent")?;
        Some(Self {
            cx: extent.attr("cx")?.parse().ok()?,
            cy: extent.attr("cy")?.parse().ok()?,
        })
    }

    /// Writes the size into both `wp:extent` and the picture's `a:xfrm/a:ext`.
    pub fn write(&self, drawing: &mut Element) {
        if let Some(node) = drawing.find_descendant_mut("wp:extent") {
            self.write_attrs(node);
        }
        if let Some(node) = drawing
            .find_descendant_mut("a:xfrm")
            .and_then(|xfrm| xfrm.child_mut("a:ext"))
        {
            self.write_attrs(node);
        }
    }

    fn write_attrs(&self, node: &mut Element) {
        node.set_attr("cx", self.cx.to_string());
        node.set_attr("cy", self.cy.to_string());
    }
}

/// Builds the `w:drawing` element for an inline picture bound to `rel_id`.
pub fn inline_drawing(rel_id: &str, drawing_id: u32, extent: Extent) -> Result<Element> {
    let Extent { cx, cy } = extent;
    let fragment = format!(
        r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0"><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{drawing_id}" name="Picture {drawing_id}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="Picture {drawing_id}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#
    );
    xml::parse(&fragment)
}

/// Relationship ids a subtree points at through `a:blip` or legacy VML
/// `v:imagedata`.
pub fn referenced_image_ids(node: &Element) -> Vec<&str> {
    node.descendants()
        .filter_map(|element| match element.name.as_str() {
            "a:blip" => element.attr("r:embed"),
            "v:imagedata" => element.attr("r:id"),
            _ => None,
        })
        .collect()
}

/// Next free `wp:docPr` id in `body`.
pub fn next_drawing_id(body: &Element) -> u32 {
    body.descendants()
        .filter(|element| element.is("wp:docPr"))
        .filter_map(|element| element.attr("id")?.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

pub fn require_header(data: &[u8], source: &str) -> Result<ImageHeader> {
    read_header(data).ok_or_else(|| {
        DocError::invalid_argument(format!(
            "{source} is not a supported image (png, jpeg, gif, bmp)"
        ))
    })
}
