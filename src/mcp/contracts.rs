use serde_json::{Map, Value, json};

pub const TOOL_CREATE_NEW_DOCUMENT: &str = "create_new_document";
pub const TOOL_GET_DOCUMENT_INFO: &str = "get_document_info";
pub const TOOL_READ_DOCUMENT_STRUCTURE: &str = "read_document_structure";
pub const TOOL_GET_DOCUMENT_TEXT: &str = "get_document_text";
pub const TOOL_READ_TABLES: &str = "read_tables";
pub const TOOL_ADD_FORMATTED_PARAGRAPH: &str = "add_formatted_paragraph";
pub const TOOL_INSERT_PARAGRAPH_AFTER: &str = "insert_paragraph_after";
pub const TOOL_REPLACE_PARAGRAPH: &str = "replace_paragraph";
pub const TOOL_DELETE_PARAGRAPH: &str = "delete_paragraph";
pub const TOOL_SEARCH_AND_REPLACE: &str = "search_and_replace";
pub const TOOL_CREATE_TABLE_WITH_DATA: &str = "create_table_with_data";
pub const TOOL_INSERT_TABLE_AFTER_PARAGRAPH: &str = "insert_table_after_paragraph";
pub const TOOL_UPDATE_TABLE_CELL: &str = "update_table_cell";
pub const TOOL_ADD_TABLE_ROW: &str = "add_table_row";
pub const TOOL_DELETE_TABLE_ROW: &str = "delete_table_row";
pub const TOOL_DELETE_TABLE: &str = "delete_table";
pub const TOOL_ADD_IMAGE: &str = "add_image";
pub const TOOL_INSERT_IMAGE_AFTER_PARAGRAPH: &str = "insert_image_after_paragraph";
pub const TOOL_GET_IMAGES_INFO: &str = "get_images_info";
pub const TOOL_READ_IMAGES: &str = "read_images";
pub const TOOL_DELETE_IMAGE: &str = "delete_image";
pub const TOOL_REPLACE_IMAGE: &str = "replace_image";

pub const MAX_INPUT_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_OUTPUT_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_TABLE_CELLS: usize = 100_000;
pub const MAX_UNPACKED_BYTES: u64 = 256 * 1024 * 1024;

const ALIGNMENTS: [&str; 4] = ["LEFT", "CENTER", "RIGHT", "JUSTIFY"];

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

fn with(base: Value, extra: Value) -> Value {
    let mut merged: Map<String, Value> = base.as_object().cloned().unwrap_or_default();
    if let Some(extra) = extra.as_object() {
        merged.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    }
    Value::Object(merged)
}

fn file_path() -> Value {
    json!({
        "file_path": {
            "type": "string",
            "description": "Path of the .docx file, relative to the document root"
        }
    })
}

fn index(description: &str) -> Value {
    json!({ "type": "integer", "minimum": 0, "description": description })
}

fn run_format_properties() -> Value {
    json!({
        "font_name": { "type": "string" },
        "font_size": { "type": "number", "exclusiveMinimum": 0, "description": "Points" },
        "is_bold": { "type": "boolean" },
        "is_italic": { "type": "boolean" },
        "is_underline": { "type": "boolean" },
        "color": { "type": "string", "pattern": "^#?[0-9A-Fa-f]{6}$" }
    })
}

fn paragraph_format_properties() -> Value {
    json!({
        "alignment": { "type": "string", "enum": ALIGNMENTS },
        "indent_first_line": {
            "type": "number",
            "minimum": 0,
            "description": "First-line indent in characters"
        },
        "line_spacing": {
            "type": "number",
            "exclusiveMinimum": 0,
            "description": "Exact line spacing in points"
        }
    })
}

fn text_properties(text_key: &str) -> Value {
    let mut text = Map::new();
    text.insert(text_key.to_string(), json!({ "type": "string" }));
    with(
        with(Value::Object(text), run_format_properties()),
        paragraph_format_properties(),
    )
}

fn table_data_properties() -> Value {
    json!({
        "rows": { "type": "integer", "minimum": 1 },
        "cols": { "type": "integer", "minimum": 1 },
        "data": {
            "type": "array",
            "items": { "type": "array", "items": { "type": "string" } },
            "description": "Cell values, row-major; missing cells stay empty"
        },
        "header_bold": { "type": "boolean", "default": true }
    })
}

fn image_properties() -> Value {
    json!({
        "image_path": {
            "type": "string",
            "description": "PNG, JPEG, GIF or BMP file, relative to the document root"
        },
        "width_inches": { "type": "number", "exclusiveMinimum": 0 },
        "height_inches": { "type": "number", "exclusiveMinimum": 0 }
    })
}

pub fn file_only_schema() -> Value {
    object(file_path(), &["file_path"])
}

pub fn create_new_document_schema() -> Value {
    object(
        with(
            file_path(),
            json!({ "overwrite": { "type": "boolean", "default": false } }),
        ),
        &["file_path"],
    )
}

pub fn read_document_structure_schema() -> Value {
    object(
        with(
            file_path(),
            json!({
                "start_index": index("First paragraph to read"),
                "count": { "type": "integer", "minimum": 1, "default": DEFAULT_PAGE_SIZE },
                "include_empty": { "type": "boolean", "default": false }
            }),
        ),
        &["file_path"],
    )
}

pub fn read_tables_schema() -> Value {
    object(
        with(file_path(), json!({ "table_index": index("Only read this table") })),
        &["file_path"],
    )
}

pub fn add_formatted_paragraph_schema() -> Value {
    object(with(file_path(), text_properties("text")), &["file_path", "text"])
}

pub fn insert_paragraph_after_schema() -> Value {
    object(
        with(
            with(file_path(), json!({ "after_index": index("Anchor paragraph") })),
            text_properties("text"),
        ),
        &["file_path", "after_index", "text"],
    )
}

pub fn replace_paragraph_schema() -> Value {
    object(
        with(
            with(file_path(), json!({ "paragraph_index": index("Paragraph to rewrite") })),
            text_properties("new_text"),
        ),
        &["file_path", "paragraph_index", "new_text"],
    )
}

pub fn delete_paragraph_schema() -> Value {
    object(
        with(file_path(), json!({ "paragraph_index": index("Paragraph to remove") })),
        &["file_path", "paragraph_index"],
    )
}

pub fn search_and_replace_schema() -> Value {
    object(
        with(
            file_path(),
            json!({
                "search_text": { "type": "string", "minLength": 1 },
                "replace_text": { "type": "string" },
                "match_case": { "type": "boolean", "default": true }
            }),
        ),
        &["file_path", "search_text", "replace_text"],
    )
}

pub fn create_table_with_data_schema() -> Value {
    object(
        with(file_path(), table_data_properties()),
        &["file_path", "rows", "cols"],
    )
}

pub fn insert_table_after_paragraph_schema() -> Value {
    object(
        with(
            with(file_path(), json!({ "after_index": index("Anchor paragraph") })),
            table_data_properties(),
        ),
        &["file_path", "after_index", "rows", "cols"],
    )
}

pub fn update_table_cell_schema() -> Value {
    object(
        with(
            with(
                file_path(),
                json!({
                    "table_index": index("Table rank in body order"),
                    "row": index("Row within the table"),
                    "col": index("Cell within the row"),
                    "new_text": { "type": "string" },
                    "shading": { "type": "string", "pattern": "^#?[0-9A-Fa-f]{6}$" }
                }),
            ),
            run_format_properties(),
        ),
        &["file_path", "table_index", "row", "col", "new_text"],
    )
}

pub fn add_table_row_schema() -> Value {
    object(
        with(
            file_path(),
            json!({
                "table_index": index("Table rank in body order"),
                "row_data": { "type": "array", "items": { "type": "string" } }
            }),
        ),
        &["file_path", "table_index"],
    )
}

pub fn delete_table_row_schema() -> Value {
    object(
        with(
            file_path(),
            json!({
                "table_index": index("Table rank in body order"),
                "row_index": index("Row to remove")
            }),
        ),
        &["file_path", "table_index", "row_index"],
    )
}

pub fn delete_table_schema() -> Value {
    object(
        with(file_path(), json!({ "table_index": index("Table rank in body order") })),
        &["file_path", "table_index"],
    )
}

pub fn add_image_schema() -> Value {
    object(
        with(
            with(file_path(), image_properties()),
            json!({ "alignment": { "type": "string", "enum": ALIGNMENTS } }),
        ),
        &["file_path", "image_path"],
    )
}

pub fn insert_image_after_paragraph_schema() -> Value {
    object(
        with(
            add_image_schema()["properties"].clone(),
            json!({ "after_index": index("Anchor paragraph") }),
        ),
        &["file_path", "after_index", "image_path"],
    )
}

pub fn read_images_schema() -> Value {
    object(
        with(
            file_path(),
            json!({ "image_index": index("Image rank in relationship order") }),
        ),
        &["file_path"],
    )
}

pub fn delete_image_schema() -> Value {
    object(
        with(
            file_path(),
            json!({ "image_index": index("Image rank in relationship order") }),
        ),
        &["file_path", "image_index"],
    )
}

pub fn replace_image_schema() -> Value {
    object(
        with(
            with(
                file_path(),
                json!({ "image_index": index("Image rank in relationship order") }),
            ),
            image_properties(),
        ),
        &["file_path", "image_index", "image_path"],
    )
}
