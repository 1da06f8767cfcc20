//! Helpers for reading and building WordprocessingML runs, paragraphs and
//! tables.

use super::xml::{Element, Node};

/// Wrappers whose runs still belong to the enclosing paragraph.
const RUN_CONTAINERS: &[&str] = &[
    "w:hyperlink",
    "w:ins",
    "w:smartTag",
    "w:fldSimple",
    "w:customXml",
    "w:sdtContent",
    "w:sdt",
];

/// Runs of a paragraph in document order, including those nested in
/// hyperlinks, insertions and similar wrappers.
pub fn paragraph_runs(paragraph: &Element) -> Vec<&Element> {
    let mut runs = Vec::new();
    collect_runs(paragraph, &mut runs);
    runs
}

fn collect_runs<'a>(parent: &'a Element, runs: &mut Vec<&'a Element>) {
    for child in parent.elements() {
        if child.is("w:r") {
            runs.push(child);
        } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
            collect_runs(child, runs);
        }
    }
}

/// Mutable access to every run, in the same order as [`paragraph_runs`].
pub fn for_each_run_mut(paragraph: &mut Element, f: &mut impl FnMut(&mut Element)) {
    for child in paragraph.elements_mut() {
        if child.is("w:r") {
            f(child);
        } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
            for_each_run_mut(child, f);
        }
    }
}

pub fn run_text(run: &Element) -> String {
    let mut text = String::new();
    for child in run.elements() {
        match child.name.as_str() {
            "w:t" => text.push_str(&child.text()),
            "w:tab" => text.push('\t'),
            "w:br" | "w:cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

pub fn paragraph_text(paragraph: &Element) -> String {
    paragraph_runs(paragraph)
        .into_iter()
        .map(run_text)
        .collect()
}

/// A run carrying `text`; newlines become `w:br` and tabs `w:tab`.
pub fn new_run(text: &str) -> Element {
    let mut run = Element::new("w:r");
    for piece in run_content(text) {
        run.push(piece);
    }
    run
}

/// Run content for `text`: `w:t` pieces split by `w:br` and `w:tab`.
pub fn run_content(text: &str) -> Vec<Element> {
    let mut content = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            content.push(Element::new("w:br"));
        }
        for (j, piece) in line.split('\t').enumerate() {
            if j > 0 {
                content.push(Element::new("w:tab"));
            }
            if !piece.is_empty() {
                content.push(text_node(piece));
            }
        }
    }
    content
}

pub fn text_node(text: &str) -> Element {
    let mut t = Element::new("w:t");
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        t.set_attr("xml:space", "preserve");
    }
    t.with_text(text)
}

/// Drops everything except the paragraph properties.
pub fn clear_paragraph(paragraph: &mut Element) {
    paragraph.children.retain(|node| match node {
        Node::Element(element) => element.is("w:pPr"),
        Node::Text(_) => false,
    });
}

pub fn table_rows(table: &Element) -> impl Iterator<Item = &Element> {
    table.children_named("w:tr")
}

pub fn row_cells(row: &Element) -> impl Iterator<Item = &Element> {
    row.children_named("w:tc")
}

/// Paragraph texts of a cell joined by newlines.
pub fn cell_text(cell: &Element) -> String {
    cell.children_named("w:p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Column count: the grid when declared, otherwise the widest row.
pub fn column_count(table: &Element) -> usize {
    let grid = table
        .child("w:tblGrid")
        .map(|grid| grid.children_named("w:gridCol").count())
        .unwrap_or(0);
    if grid > 0 {
        return grid;
    }
    table_rows(table)
        .map(|row| row_cells(row).count())
        .max()
        .unwrap_or(0)
}

/// Full text width in twips for an A4 page with the default margins.
const TABLE_WIDTH_TWIPS: u32 = 9000;

pub fn new_cell(text: &str, width: u32, bold: bool) -> Element {
    let mut paragraph = Element::new("w:p");
    if !text.is_empty() {
        let mut run = new_run(text);
        if bold {
            run.children.insert(
                0,
                Node::Element(Element::new("w:rPr").with_child(Element::new("w:b"))),
            );
        }
        paragraph.push(run);
    }
    Element::new("w:tc")
        .with_child(
            Element::new("w:tcPr").with_child(
                Element::new("w:tcW")
                    .with_attr("w:w", width.to_string())
                    .with_attr("w:type", "dxa"),
            ),
        )
        .with_child(paragraph)
}

pub fn new_row<S: AsRef<str>>(values: &[S], cols: usize, width: u32, bold: bool) -> Element {
    let mut row = Element::new("w:tr");
    for col in 0..cols {
        let text = values.get(col).map(AsRef::as_ref).unwrap_or("");
        row.push(new_cell(text, width, bold));
    }
    row
}

pub fn cell_width(cols: usize) -> u32 {
    TABLE_WIDTH_TWIPS / u32::try_from(cols.max(1)).unwrap_or(u32::MAX)
}

/// A bordered `rows` x `cols` grid; `data` fills it row-major and the first
/// row is bold when `header_bold` is set.
pub fn new_table<S: AsRef<str>>(
    rows: usize,
    cols: usize,
    data: &[Vec<S>],
    header_bold: bool,
) -> Element {
    let width = cell_width(cols);
    let border = |name: &str| {
        Element::new(name)
            .with_attr("w:val", "single")
            .with_attr("w:sz", "4")
            .with_attr("w:space", "0")
            .with_attr("w:color", "auto")
    };
    let mut borders = Element::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(border(side));
    }
    let properties = Element::new("w:tblPr")
        .with_child(Element::new("w:tblStyle").with_attr("w:val", "TableGrid"))
        .with_child(
            Element::new("w:tblW")
                .with_attr("w:w", "0")
                .with_attr("w:type", "auto"),
        )
        .with_child(borders)
        .with_child(Element::new("w:tblLook").with_attr("w:val", "04A0"));

    let mut grid = Element::new("w:tblGrid");
    for _ in 0..cols {
        grid.push(Element::new("w:gridCol").with_attr("w:w", width.to_string()));
    }

    let mut table = Element::new("w:tbl").with_child(properties).with_child(grid);
    for r in 0..rows {
        let values: &[S] = data.get(r).map(Vec::as_slice).unwrap_or(&[]);
        table.push(new_row(values, cols, width, header_bold && r == 0));
    }
    table
}

/// Width of the first cell in the table, used for rows appended later.
pub fn existing_cell_width(table: &Element, cols: usize) -> u32 {
    table
        .child("w:tblGrid")
        .and_then(|grid| grid.child("w:gridCol"))
        .and_then(|col| col.attr("w:w"))
        .and_then(|w| w.parse().ok())
        .unwrap_or_else(|| cell_width(cols))
}
