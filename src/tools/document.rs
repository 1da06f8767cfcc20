use super::{document_path, inspect, mutate, report_result, success_result};
use crate::config::ServerConfig;
use crate::docx::Document;
use crate::engine::{inspect as report, search};
use crate::error::{DocError, Result};
use crate::input::ToolArgs;
use crate::mcp::contracts::DEFAULT_PAGE_SIZE;
use serde_json::{Value, json};

pub fn create_new_document(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let overwrite = args.optional_bool("overwrite")?.unwrap_or(false);

    if path.is_dir() {
        return Err(DocError::invalid_argument(format!(
            "{} is a directory",
            path.display()
        )));
    }
    if path.exists() && !overwrite {
        return Err(DocError::invalid_argument(format!(
            "{} already exists; pass overwrite=true to replace it",
            path.display()
        )));
    }
    if let Some(parent) = path.parent()
        && !parent.is_dir()
    {
        return Err(DocError::FileNotFound(parent.to_path_buf()));
    }

    Document::blank()?.save(&path)?;
    let shown = path.display().to_string();
    Ok(success_result(
        format!("Created {shown}"),
        json!({ "file_path": shown }),
    ))
}

pub fn get_document_info(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let info = inspect(&path, |document| {
        Ok(report::document_info(document, &path.display().to_string()))
    })?;
    report_result(&info)
}

pub fn read_document_structure(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let start = args.optional_int("start_index")?.unwrap_or(0);
    let count = args.optional_int("count")?.unwrap_or(DEFAULT_PAGE_SIZE);
    let include_empty = args.optional_bool("include_empty")?.unwrap_or(false);

    let page = inspect(&path, |document| {
        report::document_structure(document, start, count, include_empty)
    })?;
    report_result(&page)
}

pub fn get_document_text(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let text = inspect(&path, |document| Ok(report::document_text(document)))?;
    let characters = text.chars().count();
    Ok(success_result(
        text.clone(),
        json!({ "text": text, "characters": characters }),
    ))
}

pub fn search_and_replace(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let search_text = args.required_str("search_text")?;
    let replace_text = args.required_str("replace_text")?;
    let match_case = args.optional_bool("match_case")?.unwrap_or(true);

    let outcome = mutate(&path, |document| {
        search::search_and_replace(document, search_text, replace_text, match_case)
    })?;
    Ok(success_result(
        format!(
            "Replaced {} occurrence(s) in {} paragraph(s)",
            outcome.replacements_made, outcome.paragraphs_modified
        ),
        json!(outcome),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::{TempDir, tempdir};

    fn setup() -> (TempDir, ServerConfig) {
        let dir = tempdir().expect("tempdir");
        let config = ServerConfig::new(dir.path()).expect("config");
        (dir, config)
    }

    fn call(
        tool: fn(&ServerConfig, &ToolArgs<'_>) -> Result<Value>,
        config: &ServerConfig,
        value: Value,
    ) -> Result<Value> {
        let args = ToolArgs::new(&value)?;
        tool(config, &args)
    }

    #[test]
    fn new_document_reports_empty_counts() {
        let (_dir, config) = setup();
        call(create_new_document, &config, json!({"file_path": "new.docx"})).expect("create");
        let info = call(get_document_info, &config, json!({"file_path": "new.docx"})).expect("info");
        let structured = &info["structuredContent"];
        assert_eq!(structured["paragraph_count"], 0);
        assert_eq!(structured["table_count"], 0);
        assert_eq!(structured["image_count"], 0);
    }

    #[test]
    fn create_refuses_existing_file_without_overwrite() {
        let (_dir, config) = setup();
        call(create_new_document, &config, json!({"file_path": "a.docx"})).expect("create");
        let err = call(create_new_document, &config, json!({"file_path": "a.docx"}))
            .expect_err("exists");
        assert!(matches!(err, DocError::InvalidArgument(_)));
        call(
            create_new_document,
            &config,
            json!({"file_path": "a.docx", "overwrite": true}),
        )
        .expect("overwrite");
    }

    #[test]
    fn create_in_missing_directory_is_file_not_found() {
        let (_dir, config) = setup();
        let err = call(create_new_document, &config, json!({"file_path": "no/such/a.docx"}))
            .expect_err("missing parent");
        assert!(matches!(err, DocError::FileNotFound(_)));
    }

    #[test]
    fn search_reports_counts() {
        let (_dir, config) = setup();
        call(create_new_document, &config, json!({"file_path": "a.docx"})).expect("create");
        call(
            crate::tools::paragraphs::add_formatted_paragraph,
            &config,
            json!({"file_path": "a.docx", "text": "foo baz foo"}),
        )
        .expect("append");

        let result = call(
            search_and_replace,
            &config,
            json!({"file_path": "a.docx", "search_text": "foo", "replace_text": "bar"}),
        )
        .expect("search");
        assert_eq!(result["structuredContent"]["paragraphs_modified"], 1);
        assert_eq!(result["structuredContent"]["replacements_made"], 2);

        let text = call(get_document_text, &config, json!({"file_path": "a.docx"})).expect("text");
        assert_eq!(text["structuredContent"]["text"], "bar baz bar");
    }

    #[test]
    fn structure_pages_default_to_non_empty_paragraphs() {
        let (_dir, config) = setup();
        call(create_new_document, &config, json!({"file_path": "a.docx"})).expect("create");
        for text in ["one", "", "three"] {
            call(
                crate::tools::paragraphs::add_formatted_paragraph,
                &config,
                json!({"file_path": "a.docx", "text": text}),
            )
            .expect("append");
        }
        let page = call(
            read_document_structure,
            &config,
            json!({"file_path": "a.docx", "count": 1}),
        )
        .expect("page");
        let structured = &page["structuredContent"];
        assert_eq!(structured["total_paragraphs"], 3);
        assert_eq!(structured["returned_count"], 1);
        assert_eq!(structured["has_more"], true);
        assert_eq!(structured["next_index"], 2);
    }
}
