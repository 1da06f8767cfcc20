use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use tempfile::tempdir;

const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89,
];

fn send_request(
    stdin: &mut std::process::ChildStdin,
    stdout: &mut BufReader<std::process::ChildStdout>,
    request: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let serialized = serde_json::to_string(&request)?;
    writeln!(stdin, "{serialized}")?;
    stdin.flush()?;

    let mut line = String::new();
    stdout.read_line(&mut line)?;
    let response: serde_json::Value = serde_json::from_str(line.trim())?;
    Ok(response)
}

fn call_tool(
    stdin: &mut std::process::ChildStdin,
    stdout: &mut BufReader<std::process::ChildStdout>,
    id: u64,
    name: &str,
    arguments: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let request = serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    });
    let response = send_request(stdin, stdout, request)?;
    Ok(response.get("result").cloned().expect("result present"))
}

#[test]
fn images_follow_relationship_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("dot.png"), PNG_1X1)?;

    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-word-edit"))
        .args(["serve", "--stdio", "--root"])
        .arg(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    call_tool(
        &mut stdin,
        &mut stdout,
        1,
        "create_new_document",
        serde_json::json!({ "file_path": "pics.docx" }),
    )?;
    for (id, text) in [(2, "caption"), (3, "closing")] {
        call_tool(
            &mut stdin,
            &mut stdout,
            id,
            "add_formatted_paragraph",
            serde_json::json!({ "file_path": "pics.docx", "text": text }),
        )?;
    }

    let inserted = call_tool(
        &mut stdin,
        &mut stdout,
        4,
        "insert_image_after_paragraph",
        serde_json::json!({
            "file_path": "pics.docx",
            "after_index": 1,
            "image_path": "dot.png",
            "width_inches": 2.0
        }),
    )?;
    assert_eq!(inserted.get("isError").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        inserted
            .pointer("/structuredContent/paragraph_index")
            .and_then(|v| v.as_u64()),
        Some(2)
    );

    let added = call_tool(
        &mut stdin,
        &mut stdout,
        5,
        "add_image",
        serde_json::json!({ "file_path": "pics.docx", "image_path": "dot.png", "alignment": "CENTER" }),
    )?;
    assert_eq!(
        added
            .pointer("/structuredContent/image_index")
            .and_then(|v| v.as_u64()),
        Some(1)
    );

    let info = call_tool(
        &mut stdin,
        &mut stdout,
        6,
        "get_images_info",
        serde_json::json!({ "file_path": "pics.docx" }),
    )?;
    assert_eq!(
        info.pointer("/structuredContent/total_images")
            .and_then(|v| v.as_u64()),
        Some(2)
    );
    assert_eq!(
        info.pointer("/structuredContent/images/0/width_inches")
            .and_then(|v| v.as_f64()),
        Some(2.0)
    );
    assert_eq!(
        info.pointer("/structuredContent/images/1/paragraph_index")
            .and_then(|v| v.as_u64()),
        Some(3)
    );

    let read = call_tool(
        &mut stdin,
        &mut stdout,
        7,
        "read_images",
        serde_json::json!({ "file_path": "pics.docx", "image_index": 0 }),
    )?;
    let content = read
        .get("content")
        .and_then(|v| v.as_array())
        .expect("content present");
    assert_eq!(content.len(), 2);
    assert_eq!(
        content[1].get("mimeType").and_then(|v| v.as_str()),
        Some("image/png")
    );

    let deleted = call_tool(
        &mut stdin,
        &mut stdout,
        8,
        "delete_image",
        serde_json::json!({ "file_path": "pics.docx", "image_index": 0 }),
    )?;
    assert_eq!(
        deleted
            .pointer("/structuredContent/remaining_images")
            .and_then(|v| v.as_u64()),
        Some(1)
    );

    let _ = child.kill();
    Ok(())
}
