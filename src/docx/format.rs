//! Run, paragraph and cell formatting, read from and written into
//! `w:rPr`, `w:pPr` and `w:tcPr`.

use super::xml::{Element, Node};
use crate::error::{DocError, Result};

const RPR_ORDER: &[&str] = &[
    "w:rStyle", "w:rFonts", "w:b", "w:bCs", "w:i", "w:iCs", "w:caps", "w:smallCaps",
    "w:strike", "w:dstrike", "w:outline", "w:shadow", "w:emboss", "w:imprint", "w:noProof",
    "w:snapToGrid", "w:vanish", "w:webHidden", "w:color", "w:spacing", "w:w", "w:kern",
    "w:position", "w:sz", "w:szCs", "w:highlight", "w:u", "w:effect", "w:bdr", "w:shd",
    "w:fitText", "w:vertAlign", "w:rtl", "w:cs", "w:em", "w:lang", "w:eastAsianLayout",
    "w:specVanish", "w:oMath",
];

const PPR_ORDER: &[&str] = &[
    "w:pStyle", "w:keepNext", "w:keepLines", "w:pageBreakBefore", "w:framePr",
    "w:widowControl", "w:numPr", "w:suppressLineNumbers", "w:pBdr", "w:shd", "w:tabs",
    "w:suppressAutoHyphens", "w:kinsoku", "w:wordWrap", "w:overflowPunct", "w:topLinePunct",
    "w:autoSpaceDE", "w:autoSpaceDN", "w:bidi", "w:adjustRightInd", "w:snapToGrid",
    "w:spacing", "w:ind", "w:contextualSpacing", "w:mirrorIndents", "w:suppressOverlap",
    "w:jc", "w:textDirection", "w:textAlignment", "w:textboxTightWrap", "w:outlineLvl",
    "w:divId", "w:cnfStyle", "w:rPr", "w:sectPr", "w:pPrChange",
];

const TCPR_ORDER: &[&str] = &[
    "w:cnfStyle", "w:tcW", "w:gridSpan", "w:hMerge", "w:vMerge", "w:tcBorders", "w:shd",
    "w:noWrap", "w:tcMar", "w:textDirection", "w:tcFitText", "w:vAlign", "w:hideMark",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LEFT" => Ok(Alignment::Left),
            "CENTER" => Ok(Alignment::Center),
            "RIGHT" => Ok(Alignment::Right),
            "JUSTIFY" => Ok(Alignment::Justify),
            _ => Err(DocError::invalid_argument(format!(
                "alignment must be LEFT, CENTER, RIGHT or JUSTIFY, got {value:?}"
            ))),
        }
    }

    fn from_jc(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }

    fn jc_value(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "LEFT",
            Alignment::Center => "CENTER",
            Alignment::Right => "RIGHT",
            Alignment::Justify => "JUSTIFY",
        }
    }

    /// Alignment declared on the paragraph itself.
    pub fn of_paragraph(paragraph: &Element) -> Option<Self> {
        paragraph
            .child("w:pPr")?
            .child("w:jc")?
            .attr("w:val")
            .and_then(Self::from_jc)
    }
}

/// Six-digit RGB hex, stored upper-case without `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Result<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(hex.to_ascii_uppercase()))
        } else {
            Err(DocError::invalid_argument(format!(
                "color must be RRGGBB hex, got {value:?}"
            )))
        }
    }

    pub fn hex(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFormat {
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub color: Option<Color>,
}

impl RunFormat {
    pub fn is_empty(&self) -> bool {
        *self == RunFormat::default()
    }

    pub fn apply(&self, run: &mut Element) {
        if self.is_empty() {
            return;
        }
        let rpr = ensure_leading(run, "w:rPr");

        if let Some(font) = &self.font_name {
            let fonts = rpr.ensure_child_ordered("w:rFonts", RPR_ORDER);
            for key in ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"] {
                fonts.set_attr(key, font.as_str());
            }
        }
        if let Some(bold) = self.bold {
            rpr.set_ordered(toggle("w:b", bold), RPR_ORDER);
        }
        if let Some(italic) = self.italic {
            rpr.set_ordered(toggle("w:i", italic), RPR_ORDER);
        }
        if let Some(color) = &self.color {
            rpr.set_ordered(
                Element::new("w:color").with_attr("w:val", color.hex()),
                RPR_ORDER,
            );
        }
        if let Some(size) = self.font_size {
            let half_points = (size * 2.0).round().to_string();
            rpr.set_ordered(
                Element::new("w:sz").with_attr("w:val", half_points.as_str()),
                RPR_ORDER,
            );
            rpr.set_ordered(
                Element::new("w:szCs").with_attr("w:val", half_points),
                RPR_ORDER,
            );
        }
        if let Some(underline) = self.underline {
            let value = if underline { "single" } else { "none" };
            rpr.set_ordered(Element::new("w:u").with_attr("w:val", value), RPR_ORDER);
        }
    }

    /// Formatting set directly on `run`; style inheritance is not resolved.
    pub fn read(run: &Element) -> Self {
        let Some(rpr) = run.child("w:rPr") else {
            return Self::default();
        };
        Self {
            font_name: rpr
                .child("w:rFonts")
                .and_then(|fonts| fonts.attr("w:ascii").or_else(|| fonts.attr("w:hAnsi")))
                .map(str::to_string),
            font_size: rpr
                .child("w:sz")
                .and_then(|sz| sz.attr("w:val"))
                .and_then(|val| val.parse::<f64>().ok())
                .map(|half_points| half_points / 2.0),
            bold: read_toggle(rpr, "w:b"),
            italic: read_toggle(rpr, "w:i"),
            underline: rpr
                .child("w:u")
                .map(|u| u.attr("w:val").is_none_or(|val| val != "none")),
            color: rpr
                .child("w:color")
                .and_then(|color| color.attr("w:val"))
                .and_then(|val| Color::parse(val).ok()),
        }
    }

    pub fn east_asia_font(run: &Element) -> Option<String> {
        run.child("w:rPr")?
            .child("w:rFonts")?
            .attr("w:eastAsia")
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: Option<Alignment>,
    /// First-line indent in characters of the run font size.
    pub first_line_indent_chars: Option<f64>,
    /// Exact line pitch in points.
    pub line_spacing_pt: Option<f64>,
}

impl ParagraphFormat {
    pub fn apply(&self, paragraph: &mut Element, font_size_pt: f64) {
        if *self == ParagraphFormat::default() {
            return;
        }
        let ppr = ensure_leading(paragraph, "w:pPr");

        if let Some(line) = self.line_spacing_pt {
            let spacing = ppr.ensure_child_ordered("w:spacing", PPR_ORDER);
            spacing.set_attr("w:line", twips(line).to_string());
            spacing.set_attr("w:lineRule", "exact");
        }
        if let Some(chars) = self.first_line_indent_chars.filter(|chars| *chars > 0.0) {
            let ind = ppr.ensure_child_ordered("w:ind", PPR_ORDER);
            ind.attrs.retain(|(key, _)| key != "w:hanging");
            ind.set_attr("w:firstLine", twips(chars * font_size_pt).to_string());
        }
        if let Some(alignment) = self.alignment {
            ppr.set_ordered(
                Element::new("w:jc").with_attr("w:val", alignment.jc_value()),
                PPR_ORDER,
            );
        }
    }
}

pub fn apply_cell_shading(cell: &mut Element, fill: &Color) {
    let tcpr = ensure_leading(cell, "w:tcPr");
    tcpr.set_ordered(
        Element::new("w:shd")
            .with_attr("w:val", "clear")
            .with_attr("w:color", "auto")
            .with_attr("w:fill", fill.hex()),
        TCPR_ORDER,
    );
}

#[cfg(test)]
pub fn cell_shading(cell: &Element) -> Option<String> {
    cell.child("w:tcPr")?
        .child("w:shd")?
        .attr("w:fill")
        .filter(|fill| *fill != "auto")
        .map(str::to_string)
}

/// `w:pStyle` of the paragraph, if it names one.
pub fn paragraph_style_id(paragraph: &Element) -> Option<&str> {
    paragraph.child("w:pPr")?.child("w:pStyle")?.attr("w:val")
}

/// Property containers (`w:pPr`, `w:rPr`, `w:tcPr`, `w:tblPr`) must be the
/// first child of their owner.
pub fn ensure_leading<'a>(owner: &'a mut Element, name: &str) -> &'a mut Element {
    if owner.position_of(name).is_none() {
        owner.children.insert(0, Node::Element(Element::new(name)));
    }
    owner.ensure_child_ordered(name, &[])
}

fn toggle(name: &str, on: bool) -> Element {
    let element = Element::new(name);
    if on {
        element
    } else {
        element.with_attr("w:val", "0")
    }
}

fn read_toggle(rpr: &Element, name: &str) -> Option<bool> {
    rpr.child(name).map(|element| {
        element
            .attr("w:val")
            .is_none_or(|val| !matches!(val, "0" | "false" | "off"))
    })
}

fn twips(points: f64) -> i64 {
    (points * 20.0).round() as i64
}
