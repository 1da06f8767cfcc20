use super::{element_at_mut, insert_block, remove_block};
use crate::docx::Document;
use crate::docx::format::{self, Color, RunFormat};
use crate::docx::wml;
use crate::docx::xml::{Element, Node};
use crate::error::{DocError, Result, checked_index};
use crate::mcp::contracts::MAX_TABLE_CELLS;
use tracing::debug;

/// Appends a table before the section properties; returns its rank.
pub fn append_table(
    document: &mut Document,
    rows: i64,
    cols: i64,
    data: &[Vec<String>],
    header_bold: bool,
) -> Result<usize> {
    let (rows, cols) = dimensions(rows, cols)?;
    let index = document.index();
    insert_block(
        document,
        index.append_position(),
        wml::new_table(rows, cols, data, header_bold),
    );
    debug!(rows, cols, "table appended");
    Ok(index.table_count())
}

/// Inserts a table directly after paragraph `after`; returns its rank.
pub fn insert_table_after_paragraph(
    document: &mut Document,
    after: i64,
    rows: i64,
    cols: i64,
    data: &[Vec<String>],
    header_bold: bool,
) -> Result<usize> {
    let index = document.index();
    let anchor = index.paragraph(after)?;
    let (rows, cols) = dimensions(rows, cols)?;
    insert_block(
        document,
        anchor + 1,
        wml::new_table(rows, cols, data, header_bold),
    );

    let rank = index
        .table_positions()
        .partition_point(|position| *position < anchor);
    debug!(after, rows, cols, rank, "table inserted");
    Ok(rank)
}

/// Removes table `target`; returns how many tables remain.
pub fn delete_table(document: &mut Document, target: i64) -> Result<usize> {
    let index = document.index();
    let position = index.table(target)?;
    remove_block(document, position);
    debug!(target, "table deleted");
    Ok(index.table_count() - 1)
}

/// Appends a row sized to the table's column count; returns the new row index.
pub fn add_row(document: &mut Document, target: i64, values: &[String]) -> Result<usize> {
    let position = document.index().table(target)?;
    let table = element_at_mut(document.body_mut(), position)?;
    let cols = wml::column_count(table);
    if cols == 0 {
        return Err(DocError::invalid_document(format!(
            "table {target} has no columns"
        )));
    }
    let width = wml::existing_cell_width(table, cols);
    let row_index = wml::table_rows(table).count();
    table.push(wml::new_row(values, cols, width, false));
    debug!(target, row_index, cols, "table row added");
    Ok(row_index)
}

/// Removes row `row` from table `target`; returns how many rows remain.
pub fn delete_row(document: &mut Document, target: i64, row: i64) -> Result<usize> {
    let position = document.index().table(target)?;
    let table = element_at_mut(document.body_mut(), position)?;
    let row_count = wml::table_rows(table).count();
    let row = checked_index("row", row, row_count)?;
    if row_count == 1 {
        return Err(DocError::invalid_argument(
            "cannot delete the only row of a table; delete the table instead",
        ));
    }

    let mut seen = 0;
    table.retain_elements(|element| {
        if !element.is("w:tr") {
            return true;
        }
        seen += 1;
        seen - 1 != row
    });
    debug!(target, row, "table row deleted");
    Ok(row_count - 1)
}

/// New content and optional styling for one cell.
#[derive(Debug, Clone, Default)]
pub struct CellUpdate<'a> {
    pub text: &'a str,
    pub run: RunFormat,
    pub shading: Option<Color>,
}

/// Overwrites the text of one cell; returns the cell text as stored.
///
/// Without explicit run formatting the cell keeps the formatting of its
/// first existing run.
pub fn update_cell(
    document: &mut Document,
    target: i64,
    row: i64,
    col: i64,
    update: &CellUpdate<'_>,
) -> Result<String> {
    let position = document.index().table(target)?;
    let table = element_at_mut(document.body_mut(), position)?;

    let row_count = wml::table_rows(table).count();
    let row = checked_index("row", row, row_count)?;
    let tr = table
        .children_named_mut("w:tr")
        .nth(row)
        .ok_or_else(|| DocError::invalid_document("table row vanished"))?;
    let cell_count = wml::row_cells(tr).count();
    let col = checked_index("column", col, cell_count)?;
    let cell = tr
        .children_named_mut("w:tc")
        .nth(col)
        .ok_or_else(|| DocError::invalid_document("table cell vanished"))?;

    rewrite_cell(cell, update);
    debug!(target, row, col, "table cell updated");
    Ok(wml::cell_text(cell))
}

fn rewrite_cell(cell: &mut Element, update: &CellUpdate<'_>) {
    let first_paragraph = cell.child("w:p");
    let kept_ppr = first_paragraph.and_then(|p| p.child("w:pPr")).cloned();
    let kept_rpr = first_paragraph
        .and_then(|p| wml::paragraph_runs(p).into_iter().next())
        .and_then(|run| run.child("w:rPr"))
        .cloned();

    cell.retain_elements(|element| !element.is("w:p") && !element.is("w:tbl"));

    let mut run = wml::new_run(update.text);
    if let Some(rpr) = kept_rpr {
        run.children.insert(0, Node::Element(rpr));
    }
    update.run.apply(&mut run);
    let mut paragraph = Element::new("w:p");
    if let Some(ppr) = kept_ppr {
        paragraph.push(ppr);
    }
    paragraph.push(run);
    cell.push(paragraph);

    if let Some(fill) = &update.shading {
        format::apply_cell_shading(cell, fill);
    }
}

fn dimensions(rows: i64, cols: i64) -> Result<(usize, usize)> {
    let (rows, cols) = match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(rows), Ok(cols)) if rows >= 1 && cols >= 1 => (rows, cols),
        _ => {
            return Err(DocError::invalid_argument(format!(
                "rows and cols must be at least 1, got {rows}x{cols}"
            )));
        }
    };
    if rows.checked_mul(cols).is_none_or(|cells| cells > MAX_TABLE_CELLS) {
        return Err(DocError::invalid_argument(format!(
            "table exceeds limit: {rows}x{cols} cells (max {MAX_TABLE_CELLS})"
        )));
    }
    Ok((rows, cols))
}
