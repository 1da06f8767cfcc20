use serde_json::json;

pub mod contracts;
pub mod errors;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    vec![
        json!({
            "name": contracts::TOOL_CREATE_NEW_DOCUMENT,
            "description": "Create a new, empty .docx document.",
            "inputSchema": contracts::create_new_document_schema()
        }),
        json!({
            "name": contracts::TOOL_GET_DOCUMENT_INFO,
            "description": "Overview of a document: paragraph, table and image counts plus a preview of each non-empty paragraph.",
            "inputSchema": contracts::file_only_schema()
        }),
        json!({
            "name": contracts::TOOL_READ_DOCUMENT_STRUCTURE,
            "description": "Read paragraphs page by page with style, alignment and run formatting.",
            "inputSchema": contracts::read_document_structure_schema()
        }),
        json!({
            "name": contracts::TOOL_GET_DOCUMENT_TEXT,
            "description": "Plain text of the document in body order.",
            "inputSchema": contracts::file_only_schema()
        }),
        json!({
            "name": contracts::TOOL_READ_TABLES,
            "description": "Read table dimensions and cell text.",
            "inputSchema": contracts::read_tables_schema()
        }),
        json!({
            "name": contracts::TOOL_ADD_FORMATTED_PARAGRAPH,
            "description": "Append a paragraph with optional font and paragraph formatting.",
            "inputSchema": contracts::add_formatted_paragraph_schema()
        }),
        json!({
            "name": contracts::TOOL_INSERT_PARAGRAPH_AFTER,
            "description": "Insert a paragraph directly after the paragraph at after_index.",
            "inputSchema": contracts::insert_paragraph_after_schema()
        }),
        json!({
            "name": contracts::TOOL_REPLACE_PARAGRAPH,
            "description": "Replace the content of a paragraph, keeping its position.",
            "inputSchema": contracts::replace_paragraph_schema()
        }),
        json!({
            "name": contracts::TOOL_DELETE_PARAGRAPH,
            "description": "Delete a paragraph; later paragraph indices shift down by one.",
            "inputSchema": contracts::delete_paragraph_schema()
        }),
        json!({
            "name": contracts::TOOL_SEARCH_AND_REPLACE,
            "description": "Replace text inside runs of body and table paragraphs, keeping run formatting. Matches spanning runs are not found.",
            "inputSchema": contracts::search_and_replace_schema()
        }),
        json!({
            "name": contracts::TOOL_CREATE_TABLE_WITH_DATA,
            "description": "Append a bordered table filled row-major from data.",
            "inputSchema": contracts::create_table_with_data_schema()
        }),
        json!({
            "name": contracts::TOOL_INSERT_TABLE_AFTER_PARAGRAPH,
            "description": "Insert a bordered table directly after the paragraph at after_index.",
            "inputSchema": contracts::insert_table_after_paragraph_schema()
        }),
        json!({
            "name": contracts::TOOL_UPDATE_TABLE_CELL,
            "description": "Overwrite the text of one table cell, optionally restyling it.",
            "inputSchema": contracts::update_table_cell_schema()
        }),
        json!({
            "name": contracts::TOOL_ADD_TABLE_ROW,
            "description": "Append a row to a table.",
            "inputSchema": contracts::add_table_row_schema()
        }),
        json!({
            "name": contracts::TOOL_DELETE_TABLE_ROW,
            "description": "Delete one row of a table.",
            "inputSchema": contracts::delete_table_row_schema()
        }),
        json!({
            "name": contracts::TOOL_DELETE_TABLE,
            "description": "Delete a table.",
            "inputSchema": contracts::delete_table_schema()
        }),
        json!({
            "name": contracts::TOOL_ADD_IMAGE,
            "description": "Append a paragraph holding an image.",
            "inputSchema": contracts::add_image_schema()
        }),
        json!({
            "name": contracts::TOOL_INSERT_IMAGE_AFTER_PARAGRAPH,
            "description": "Insert a paragraph holding an image directly after the paragraph at after_index.",
            "inputSchema": contracts::insert_image_after_paragraph_schema()
        }),
        json!({
            "name": contracts::TOOL_GET_IMAGES_INFO,
            "description": "Metadata of every image, indexed in relationship order.",
            "inputSchema": contracts::file_only_schema()
        }),
        json!({
            "name": contracts::TOOL_READ_IMAGES,
            "description": "Return image bytes as MCP image content.",
            "inputSchema": contracts::read_images_schema()
        }),
        json!({
            "name": contracts::TOOL_DELETE_IMAGE,
            "description": "Delete an image and every run that shows it.",
            "inputSchema": contracts::delete_image_schema()
        }),
        json!({
            "name": contracts::TOOL_REPLACE_IMAGE,
            "description": "Replace the bytes of an image, keeping its index and position.",
            "inputSchema": contracts::replace_image_schema()
        }),
    ]
}
