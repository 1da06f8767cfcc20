use super::{document_path, inspect, mutate, report_result, success_result};
use crate::config::ServerConfig;
use crate::engine::tables::{self, CellUpdate};
use crate::engine::inspect as report;
use crate::error::Result;
use crate::input::ToolArgs;
use serde_json::{Value, json};

pub fn read_tables(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let only = args.optional_int("table_index")?;
    let tables = inspect(&path, |document| report::read_tables(document, only))?;
    report_result(&tables)
}

struct NewTable {
    rows: i64,
    cols: i64,
    data: Vec<Vec<String>>,
    header_bold: bool,
}

fn new_table(args: &ToolArgs<'_>) -> Result<NewTable> {
    Ok(NewTable {
        rows: args.required_int("rows")?,
        cols: args.required_int("cols")?,
        data: args.string_grid("data")?.unwrap_or_default(),
        header_bold: args.optional_bool("header_bold")?.unwrap_or(true),
    })
}

pub fn create_table_with_data(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let table = new_table(args)?;

    let rank = mutate(&path, |document| {
        tables::append_table(document, table.rows, table.cols, &table.data, table.header_bold)
    })?;
    Ok(success_result(
        format!("Added {}x{} table {rank}", table.rows, table.cols),
        json!({ "table_index": rank, "rows": table.rows, "cols": table.cols }),
    ))
}

pub fn insert_table_after_paragraph(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let after = args.required_int("after_index")?;
    let table = new_table(args)?;

    let rank = mutate(&path, |document| {
        tables::insert_table_after_paragraph(
            document,
            after,
            table.rows,
            table.cols,
            &table.data,
            table.header_bold,
        )
    })?;
    Ok(success_result(
        format!("Inserted table {rank} after paragraph {after}"),
        json!({ "table_index": rank, "rows": table.rows, "cols": table.cols }),
    ))
}

pub fn update_table_cell(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("table_index")?;
    let row = args.required_int("row")?;
    let col = args.required_int("col")?;
    let update = CellUpdate {
        text: args.required_str("new_text")?,
        run: args.run_format()?,
        shading: args.color("shading")?,
    };

    let text = mutate(&path, |document| {
        tables::update_cell(document, target, row, col, &update)
    })?;
    Ok(success_result(
        format!("Updated cell ({row}, {col}) of table {target}"),
        json!({ "table_index": target, "row": row, "col": col, "text": text }),
    ))
}

pub fn add_table_row(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("table_index")?;
    let values = args.string_list("row_data")?.unwrap_or_default();

    let row = mutate(&path, |document| tables::add_row(document, target, &values))?;
    Ok(success_result(
        format!("Added row {row} to table {target}"),
        json!({ "table_index": target, "row_index": row }),
    ))
}

pub fn delete_table_row(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("table_index")?;
    let row = args.required_int("row_index")?;

    let remaining = mutate(&path, |document| tables::delete_row(document, target, row))?;
    Ok(success_result(
        format!("Deleted row {row} of table {target}; {remaining} rows remain"),
        json!({ "table_index": target, "remaining_rows": remaining }),
    ))
}

pub fn delete_table(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("table_index")?;

    let remaining = mutate(&path, |document| tables::delete_table(document, target))?;
    Ok(success_result(
        format!("Deleted table {target}; {remaining} remain"),
        json!({ "deleted_index": target, "remaining_tables": remaining }),
    ))
}
