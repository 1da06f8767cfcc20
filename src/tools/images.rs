use super::{document_path, inspect, mutate, report_result, success_result};
use crate::config::ServerConfig;
use crate::engine::images::{self, Placement};
use crate::engine::inspect as report;
use crate::error::{DocError, Result};
use crate::input::{self, ToolArgs};
use crate::mcp::contracts::MAX_OUTPUT_BYTES;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::debug;

/// Image bytes named by `image_path`, plus that path for error messages.
fn image_source(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<(Vec<u8>, String)> {
    let raw = args.required_str("image_path")?;
    let bytes = input::read_image_source(&config.resolve(raw)?)?;
    Ok((bytes, raw.to_string()))
}

fn placement(args: &ToolArgs<'_>, with_alignment: bool) -> Result<Placement> {
    Ok(Placement {
        width_inches: args.positive_number("width_inches")?,
        height_inches: args.positive_number("height_inches")?,
        alignment: if with_alignment {
            args.alignment()?
        } else {
            None
        },
    })
}

pub fn add_image(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let placement = placement(args, true)?;
    let (bytes, source) = image_source(config, args)?;

    let inserted = mutate(&path, |document| {
        images::add_image(document, bytes, &source, &placement)
    })?;
    Ok(success_result(
        format!(
            "Added image {} in paragraph {}",
            inserted.image_index, inserted.paragraph_index
        ),
        json!({
            "image_index": inserted.image_index,
            "paragraph_index": inserted.paragraph_index,
            "rel_id": inserted.rel_id,
        }),
    ))
}

pub fn insert_image_after_paragraph(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let after = args.required_int("after_index")?;
    let placement = placement(args, true)?;
    let (bytes, source) = image_source(config, args)?;

    let inserted = mutate(&path, |document| {
        images::insert_image_after_paragraph(document, after, bytes, &source, &placement)
    })?;
    Ok(success_result(
        format!(
            "Inserted image {} as paragraph {}",
            inserted.image_index, inserted.paragraph_index
        ),
        json!({
            "image_index": inserted.image_index,
            "paragraph_index": inserted.paragraph_index,
            "rel_id": inserted.rel_id,
        }),
    ))
}

pub fn get_images_info(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let info = inspect(&path, |document| Ok(report::images_info(document)))?;
    report_result(&info)
}

/// Image bytes as MCP image blocks. Blocks stop once the encoded payload
/// would pass `MAX_OUTPUT_BYTES`; the remaining images are still described.
pub fn read_images(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let only = args.optional_int("image_index")?;
    let images = inspect(&path, |document| report::read_images(document, only))?;

    let mut content = Vec::with_capacity(images.len() + 1);
    let mut described = Vec::with_capacity(images.len());
    let mut budget = MAX_OUTPUT_BYTES;
    for image in images {
        let encoded_len = image.data.len().div_ceil(3) as u64 * 4;
        let inlined = !image.data.is_empty() && encoded_len <= budget;
        if inlined {
            budget -= encoded_len;
            content.push(json!({
                "type": "image",
                "data": STANDARD.encode(&image.data),
                "mimeType": image.info.content_type.unwrap_or("application/octet-stream"),
            }));
        } else {
            debug!(rel_id = %image.info.rel_id, "image not inlined");
        }
        let mut entry = serde_json::to_value(&image.info)
            .map_err(|err| DocError::io("failed to serialize image info", err.into()))?;
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("inlined".to_string(), json!(inlined));
        }
        described.push(entry);
    }

    let structured = json!({ "returned_images": described.len(), "images": described });
    let summary = serde_json::to_string_pretty(&structured)
        .map_err(|err| DocError::io("failed to serialize image info", err.into()))?;
    content.insert(0, json!({ "type": "text", "text": summary }));
    Ok(json!({
        "content": content,
        "structuredContent": structured,
        "isError": false
    }))
}

pub fn delete_image(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("image_index")?;

    let remaining = mutate(&path, |document| images::delete_image(document, target))?;
    Ok(success_result(
        format!("Deleted image {target}; {remaining} remain"),
        json!({ "deleted_index": target, "remaining_images": remaining }),
    ))
}

pub fn replace_image(config: &ServerConfig, args: &ToolArgs<'_>) -> Result<Value> {
    let path = document_path(config, args)?;
    let target = args.required_int("image_index")?;
    let placement = placement(args, false)?;
    let (bytes, source) = image_source(config, args)?;

    let info = mutate(&path, |document| {
        images::replace_image(document, target, bytes, &source, &placement)?;
        let rank = usize::try_from(target).unwrap_or_default();
        report::images_info(document)
            .images
            .into_iter()
            .nth(rank)
            .ok_or_else(|| DocError::invalid_document("replaced image vanished"))
    })?;
    report_result(&info)
}
