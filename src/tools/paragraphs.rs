use super::{document_path, mutate, success_result};
use crate::config::ServerConfig;
use crate::engine::{TextStyle, paragraphs};
use crate::error::Result;
use crate::input::ToolArgs;
use serde_json::{Value, json};

fn text_style(args: &ToolArgs<'_>) -> Result<TextStyle> {
    Ok(TextStyle {
        run: args.run_format()?,
        paragraph: args.paragraph_format()?,
    })
}

pub fn add_formatted_paragraph(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let text = args.required_str("text")?;
    let style = text_style(args)?;

    let rank = mutate(&path, |document| {
        paragraphs::append_paragraph(document, text, &style)
    })?;
    Ok(success_result(
        format!("Added paragraph {rank}"),
        json!({ "paragraph_index": rank }),
    ))
}

pub fn insert_paragraph_after(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let after = args.required_int("after_index")?;
    let text = args.required_str("text")?;
    let style = text_style(args)?;

    let rank = mutate(&path, |document| {
        paragraphs::insert_paragraph_after(document, after, text, &style)
    })?;
    Ok(success_result(
        format!("Inserted paragraph {rank} after paragraph {after}"),
        json!({ "paragraph_index": rank }),
    ))
}

pub fn replace_paragraph(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("paragraph_index")?;
    let text = args.required_str("new_text")?;
    let style = text_style(args)?;

    let rank = mutate(&path, |document| {
        paragraphs::replace_paragraph(document, target, text, &style)
    })?;
    Ok(success_result(
        format!("Replaced paragraph {rank}"),
        json!({ "paragraph_index": rank }),
    ))
}

pub fn delete_paragraph(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("paragraph_index")?;

    let remaining = mutate(&path, |document| paragraphs::delete_paragraph(document, target))?;
    Ok(success_result(
        format!("Deleted paragraph {target}; {remaining} remain"),
        json!({ "deleted_index": target, "remaining_paragraphs": remaining }),
    ))
}
