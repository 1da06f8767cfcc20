use crate::config::ServerConfig;
use crate::docx::Document;
use crate::error::{DocError, Result};
use crate::input::ToolArgs;
use crate::mcp::{contracts, errors};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{info, warn};

pub mod document;
pub mod images;
pub mod paragraphs;
pub mod tables;

pub fn error_result(
    kind: &'static str,
    message: impl Into<String>,
    source: Option<&str>,
) -> serde_json::Value {
    let message = message.into();
    let mut error = json!({
        "kind": kind,
        "message": message,
    });

    if let Some(source) = source
        && let Some(obj) = error.as_object_mut()
    {
        obj.insert("source".to_string(), json!(source));
    }

    json!({
        "content": [{"type": "text", "text": format!("Error: {message}")}],
        "structuredContent": {"error": error},
        "isError": true
    })
}

pub fn success_result(text: impl Into<String>, structured: Value) -> Value {
    json!({
        "content": [{"type": "text", "text": text.into()}],
        "structuredContent": structured,
        "isError": false
    })
}

/// Success result whose text block is the pretty-printed report.
fn report_result<T: Serialize>(report: &T) -> Result<Value> {
    let structured = serde_json::to_value(report)
        .map_err(|err| DocError::io("failed to serialize report", err.into()))?;
    let text = serde_json::to_string_pretty(&structured)
        .map_err(|err| DocError::io("failed to serialize report", err.into()))?;
    Ok(success_result(text, structured))
}

/// Opens `path`, runs `edit` and saves only when it succeeded.
fn mutate<T>(path: &Path, edit: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
    let mut document = Document::open(path)?;
    let outcome = edit(&mut document)?;
    document.save(path)?;
    Ok(outcome)
}

/// Opens `path` for reading; nothing is written back.
fn inspect<T>(path: &Path, read: impl FnOnce(&Document) -> Result<T>) -> Result<T> {
    let document = Document::open(path)?;
    read(&document)
}

fn document_path(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<std::path::PathBuf> {
    config.resolve(args.required_str("file_path")?)
}

type ToolFn = fn(&ServerConfig, &ToolArgs<'_>) -> Result<Value>;

fn lookup(name: &str) -> Option<ToolFn> {
    let tool: ToolFn = match name {
        contracts::TOOL_CREATE_NEW_DOCUMENT => document::create_new_document,
        contracts::TOOL_GET_DOCUMENT_INFO => document::get_document_info,
        contracts::TOOL_READ_DOCUMENT_STRUCTURE => document::read_document_structure,
        contracts::TOOL_GET_DOCUMENT_TEXT => document::get_document_text,
        contracts::TOOL_SEARCH_AND_REPLACE => document::search_and_replace,
        contracts::TOOL_ADD_FORMATTED_PARAGRAPH => paragraphs::add_formatted_paragraph,
        contracts::TOOL_INSERT_PARAGRAPH_AFTER => paragraphs::insert_paragraph_after,
        contracts::TOOL_REPLACE_PARAGRAPH => paragraphs::replace_paragraph,
        contracts::TOOL_DELETE_PARAGRAPH => paragraphs::delete_paragraph,
        contracts::TOOL_READ_TABLES => tables::read_tables,
        contracts::TOOL_CREATE_TABLE_WITH_DATA => tables::create_table_with_data,
        contracts::TOOL_INSERT_TABLE_AFTER_PARAGRAPH => tables::insert_table_after_paragraph,
        contracts::TOOL_UPDATE_TABLE_CELL => tables::update_table_cell,
        contracts::TOOL_ADD_TABLE_ROW => tables::add_table_row,
        contracts::TOOL_DELETE_TABLE_ROW => tables::delete_table_row,
        contracts::TOOL_DELETE_TABLE => tables::delete_table,
        contracts::TOOL_ADD_IMAGE => images::add_image,
        contracts::TOOL_INSERT_IMAGE_AFTER_PARAGRAPH => images::insert_image_after_paragraph,
        contracts::TOOL_GET_IMAGES_INFO => images::get_images_info,
        contracts::TOOL_READ_IMAGES => images::read_images,
        contracts::TOOL_DELETE_IMAGE => images::delete_image,
        contracts::TOOL_REPLACE_IMAGE => images::replace_image,
        _ => return None,
    };
    Some(tool)
}

/// Runs tool `name` and wraps the outcome in an MCP tool result.
pub fn dispatch(config: &ServerConfig, name: &str, args: &Value) -> Value {
    let Some(tool) = lookup(name) else {
        return error_result(
            errors::INVALID_ARGUMENT,
            format!("unknown tool: {name}"),
            Some(name),
        );
    };

    let source = args.get("file_path").and_then(Value::as_str);
    info!(tool = name, path = source.unwrap_or("-"), "tool call");
    match ToolArgs::new(args).and_then(|args| tool(config, &args)) {
        Ok(result) => result,
        Err(err) => {
            warn!(tool = name, kind = err.kind(), "{err}");
            error_result(err.kind(), err.to_string(), source)
        }
    }
}
