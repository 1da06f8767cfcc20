use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use tempfile::tempdir;

/// Builds a one-paragraph, one-table document through the stdio server.
fn seed_document(root: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-word-edit"))
        .args(["serve", "--stdio", "--root"])
        .arg(root)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    let mut stdin = child.stdin.take().expect("stdin available");
    let mut stdout = BufReader::new(child.stdout.take().expect("stdout available"));

    for (id, name, arguments) in [
        (1, "create_new_document", serde_json::json!({ "file_path": "cli.docx" })),
        (
            2,
            "add_formatted_paragraph",
            serde_json::json!({ "file_path": "cli.docx", "text": "Hello" }),
        ),
        (
            3,
            "create_table_with_data",
            serde_json::json!({ "file_path": "cli.docx", "rows": 1, "cols": 2, "data": [["x", "y"]] }),
        ),
    ] {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        });
        writeln!(stdin, "{}", serde_json::to_string(&request)?)?;
        stdin.flush()?;
        let mut line = String::new();
        stdout.read_line(&mut line)?;
        let response: serde_json::Value = serde_json::from_str(line.trim())?;
        assert_eq!(
            response.pointer("/result/isError").and_then(|v| v.as_bool()),
            Some(false)
        );
    }

    let _ = child.kill();
    Ok(())
}

#[test]
fn cli_info_outputs_json() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_document(dir.path())?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-word-edit"))
        .args(["info", "--path", "cli.docx", "--json", "--root"])
        .arg(dir.path())
        .output()?;

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value.get("paragraph_count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(value.get("table_count").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(value.get("image_count").and_then(|v| v.as_u64()), Some(0));
    Ok(())
}

#[test]
fn cli_text_reads_root_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    seed_document(dir.path())?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-word-edit"))
        .args(["text", "--path", "cli.docx"])
        .env("WORD_MCP_ROOT", dir.path())
        .output()?;

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?.trim_end(), "Hello\nx\ty");
    Ok(())
}

#[test]
fn cli_reports_errors_on_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let output = Command::new(env!("CARGO_BIN_EXE_mcp-word-edit"))
        .args(["tables", "--path", "missing.docx", "--root"])
        .arg(dir.path())
        .output()?;

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    Ok(())
}
