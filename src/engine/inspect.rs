//! Read-only reports over a document.

use crate::docx::Document;
use crate::docx::document::Relationship;
use crate::docx::format::{self, Alignment, RunFormat};
use crate::docx::index::{BlockKind, StructuralIndex};
use crate::docx::media::{self, Extent};
use crate::docx::wml;
use crate::docx::xml::Element;
use crate::error::{DocError, Result};
use serde::Serialize;
use std::collections::HashMap;

const PREVIEW_CHARS: usize = 50;
const DEFAULT_STYLE: &str = "Normal";

#[derive(Debug, Clone, Serialize)]
pub struct ParagraphSummary {
    pub index: usize,
    pub preview: String,
    pub style: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub file_path: String,
    pub paragraph_count: usize,
    pub non_empty_paragraphs: usize,
    pub table_count: usize,
    pub image_count: usize,
    pub paragraphs_summary: Vec<ParagraphSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunDetail {
    pub text: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub font_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub east_asia_font: Option<String>,
    pub font_size: Option<f64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParagraphDetail {
    pub index: usize,
    pub text: String,
    pub style_name: String,
    pub alignment: &'static str,
    pub runs: Vec<RunDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentStructure {
    pub total_paragraphs: usize,
    pub start_index: usize,
    pub returned_count: usize,
    pub has_more: bool,
    /// First paragraph the next page would start from.
    pub next_index: Option<usize>,
    pub paragraphs: Vec<ParagraphDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableData {
    pub table_index: usize,
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TablesReport {
    pub total_tables: usize,
    pub tables: Vec<TableData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    pub index: usize,
    pub rel_id: String,
    pub target: String,
    pub external: bool,
    pub format: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub size_bytes: usize,
    pub width_px: Option<u32>,
    pub height_px: Option<u32>,
    pub width_inches: Option<f64>,
    pub height_inches: Option<f64>,
    /// Rank of the top-level paragraph that first shows the image.
    pub paragraph_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImagesInfo {
    pub total_images: usize,
    pub images: Vec<ImageInfo>,
}

/// Image metadata together with the media bytes; `data` is empty for
/// linked images.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub info: ImageInfo,
    pub data: Vec<u8>,
}

pub fn document_info(document: &Document, file_path: &str) -> DocumentInfo {
    let index = document.index();
    let styles = document.style_names();
    let paragraphs = paragraphs(document, &index);

    let paragraphs_summary: Vec<ParagraphSummary> = paragraphs
        .iter()
        .enumerate()
        .filter_map(|(rank, paragraph)| {
            let text = wml::paragraph_text(paragraph);
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| ParagraphSummary {
                index: rank,
                preview: preview(trimmed),
                style: style_name(&styles, paragraph),
            })
        })
        .collect();

    DocumentInfo {
        file_path: file_path.to_string(),
        paragraph_count: index.paragraph_count(),
        non_empty_paragraphs: paragraphs_summary.len(),
        table_count: index.table_count(),
        image_count: index.image_count(),
        paragraphs_summary,
    }
}

/// One page of paragraph details starting at paragraph `start`.
pub fn document_structure(
    document: &Document,
    start: i64,
    count: i64,
    include_empty: bool,
) -> Result<DocumentStructure> {
    let start = usize::try_from(start).map_err(|_| {
        DocError::invalid_argument(format!("start_index must not be negative, got {start}"))
    })?;
    let count = usize::try_from(count)
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| DocError::invalid_argument(format!("count must be at least 1, got {count}")))?;

    let index = document.index();
    let styles = document.style_names();
    let mut entries = Vec::new();
    let mut next_index = None;

    for (rank, paragraph) in paragraphs(document, &index).into_iter().enumerate().skip(start) {
        let text = wml::paragraph_text(paragraph);
        if !include_empty && text.trim().is_empty() {
            continue;
        }
        if entries.len() == count {
            next_index = Some(rank);
            break;
        }
        entries.push(ParagraphDetail {
            index: rank,
            text,
            style_name: style_name(&styles, paragraph),
            alignment: Alignment::of_paragraph(paragraph)
                .unwrap_or(Alignment::Left)
                .as_str(),
            runs: wml::paragraph_runs(paragraph)
                .into_iter()
                .map(describe_run)
                .collect(),
        });
    }

    Ok(DocumentStructure {
        total_paragraphs: index.paragraph_count(),
        start_index: start,
        returned_count: entries.len(),
        has_more: next_index.is_some(),
        next_index,
        paragraphs: entries,
    })
}

/// Every top-level table, or only `only` when given.
pub fn read_tables(document: &Document, only: Option<i64>) -> Result<TablesReport> {
    let index = document.index();
    let selected: Vec<usize> = match only {
        Some(target) => {
            index.table(target)?;
            vec![usize::try_from(target).unwrap_or_default()]
        }
        None => (0..index.table_count()).collect(),
    };

    let tables = selected
        .into_iter()
        .filter_map(|rank| {
            let table = block(document, index.table_positions()[rank])?;
            let data: Vec<Vec<String>> = wml::table_rows(table)
                .map(|row| wml::row_cells(row).map(wml::cell_text).collect())
                .collect();
            Some(TableData {
                table_index: rank,
                rows: data.len(),
                cols: wml::column_count(table),
                data,
            })
        })
        .collect();

    Ok(TablesReport {
        total_tables: index.table_count(),
        tables,
    })
}

pub fn images_info(document: &Document) -> ImagesInfo {
    let index = document.index();
    let images = describe_images(document, &index)
        .into_iter()
        .map(|image| image.info)
        .collect();
    ImagesInfo {
        total_images: index.image_count(),
        images,
    }
}

/// Metadata plus bytes for every image, or only `only` when given.
pub fn read_images(document: &Document, only: Option<i64>) -> Result<Vec<ImageData>> {
    let index = document.index();
    if let Some(target) = only {
        index.image(target)?;
    }
    let mut images = describe_images(document, &index);
    if let Some(target) = only.and_then(|target| usize::try_from(target).ok()) {
        images = images.into_iter().skip(target).take(1).collect();
    }
    Ok(images)
}

/// Plain text in body order: one line per paragraph, table cells separated
/// by tabs and rows by newlines.
pub fn document_text(document: &Document) -> String {
    let index = document.index();
    let mut blocks = Vec::with_capacity(index.blocks().len());
    for entry in index.blocks() {
        let Some(element) = block(document, entry.position) else {
            continue;
        };
        match entry.kind {
            BlockKind::Paragraph => blocks.push(wml::paragraph_text(element)),
            BlockKind::Table => blocks.push(
                wml::table_rows(element)
                    .map(|row| {
                        wml::row_cells(row)
                            .map(wml::cell_text)
                            .collect::<Vec<_>>()
                            .join("\t")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
    blocks.join("\n")
}

#[cfg(test)]
pub fn paragraph_texts(document: &Document) -> Vec<String> {
    let index = document.index();
    paragraphs(document, &index)
        .into_iter()
        .map(wml::paragraph_text)
        .collect()
}

fn block(document: &Document, position: usize) -> Option<&Element> {
    document.body().children.get(position)?.as_element()
}

fn paragraphs<'a>(document: &'a Document, index: &StructuralIndex) -> Vec<&'a Element> {
    index
        .paragraph_positions()
        .iter()
        .filter_map(|position| block(document, *position))
        .collect()
}

fn style_name(styles: &HashMap<String, String>, paragraph: &Element) -> String {
    match format::paragraph_style_id(paragraph) {
        Some(id) => styles.get(id).cloned().unwrap_or_else(|| id.to_string()),
        None => styles
            .get(DEFAULT_STYLE)
            .cloned()
            .unwrap_or_else(|| DEFAULT_STYLE.to_string()),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

fn describe_run(run: &Element) -> RunDetail {
    let format = RunFormat::read(run);
    RunDetail {
        text: wml::run_text(run),
        bold: format.bold,
        italic: format.italic,
        underline: format.underline,
        font_name: format.font_name,
        east_asia_font: RunFormat::east_asia_font(run),
        font_size: format.font_size,
        color: format.color.map(|color| color.hex().to_string()),
    }
}

fn describe_images(document: &Document, index: &StructuralIndex) -> Vec<ImageData> {
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (rank, paragraph) in paragraphs(document, index).into_iter().enumerate() {
        for id in media::referenced_image_ids(paragraph) {
            owners.entry(id).or_insert(rank);
        }
    }

    let mut extents: HashMap<&str, Extent> = HashMap::new();
    for drawing in document
        .body()
        .descendants()
        .filter(|element| element.is("w:drawing"))
    {
        let Some(extent) = Extent::read(drawing) else {
            continue;
        };
        for id in media::referenced_image_ids(drawing) {
            extents.entry(id).or_insert(extent);
        }
    }

    index
        .images()
        .iter()
        .enumerate()
        .map(|(rank, rel)| describe_image(document, rank, rel, &owners, &extents))
        .collect()
}

fn describe_image(
    document: &Document,
    rank: usize,
    rel: &Relationship,
    owners: &HashMap<&str, usize>,
    extents: &HashMap<&str, Extent>,
) -> ImageData {
    let data = rel
        .part_name()
        .and_then(|name| document.part(&name))
        .map(<[u8]>::to_vec)
        .unwrap_or_default();
    let header = media::read_header(&data);
    let extent = extents.get(rel.id.as_str());

    ImageData {
        info: ImageInfo {
            index: rank,
            rel_id: rel.id.clone(),
            target: rel.target.clone(),
            external: rel.external,
            format: header.map(|header| header.format.as_str()),
            content_type: header.map(|header| header.format.content_type()),
            size_bytes: data.len(),
            width_px: header.map(|header| header.width_px),
            height_px: header.map(|header| header.height_px),
            width_inches: extent.map(|extent| round_inches(extent.width_inches())),
            height_inches: extent.map(|extent| round_inches(extent.height_inches())),
            paragraph_index: owners.get(rel.id.as_str()).copied(),
        },
        data,
    }
}

fn round_inches(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
