use crate::docx::format::{Alignment, Color, ParagraphFormat, RunFormat};
use crate::error::{DocError, Result};
use crate::mcp::contracts::MAX_INPUT_BYTES;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;

/// Typed access to a `tools/call` arguments object. `null` counts as absent.
#[derive(Debug, Clone, Copy)]
pub struct ToolArgs<'a> {
    obj: &'a Map<String, Value>,
}

impl<'a> ToolArgs<'a> {
    pub fn new(args: &'a Value) -> Result<Self> {
        args.as_object()
            .map(|obj| Self { obj })
            .ok_or_else(|| DocError::invalid_argument("arguments must be an object"))
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj.get(key).filter(|value| !value.is_null())
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str> {
        self.optional_str(key)?
            .ok_or_else(|| DocError::invalid_argument(format!("{key} is required")))
    }

    pub fn optional_str(&self, key: &str) -> Result<Option<&'a str>> {
        self.get(key)
            .map(|value| {
                value
                    .as_str()
                    .ok_or_else(|| DocError::invalid_argument(format!("{key} must be a string")))
            })
            .transpose()
    }

    pub fn required_int(&self, key: &str) -> Result<i64> {
        self.optional_int(key)?
            .ok_or_else(|| DocError::invalid_argument(format!("{key} is required")))
    }

    /// Integers may arrive as `3` or `3.0`; fractional values are rejected.
    /// Whole numbers beyond `i64` saturate so index checks still report them
    /// as out of range.
    pub fn optional_int(&self, key: &str) -> Result<Option<i64>> {
        self.get(key)
            .map(|value| {
                value
                    .as_i64()
                    .or_else(|| value.as_u64().map(|_| i64::MAX))
                    .or_else(|| {
                        value
                            .as_f64()
                            .filter(|number| number.is_finite() && number.fract() == 0.0)
                            .map(|number| number as i64)
                    })
                    .ok_or_else(|| DocError::invalid_argument(format!("{key} must be an integer")))
            })
            .transpose()
    }

    pub fn optional_bool(&self, key: &str) -> Result<Option<bool>> {
        self.get(key)
            .map(|value| {
                value
                    .as_bool()
                    .ok_or_else(|| DocError::invalid_argument(format!("{key} must be a boolean")))
            })
            .transpose()
    }

    pub fn optional_number(&self, key: &str) -> Result<Option<f64>> {
        self.get(key)
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| DocError::invalid_argument(format!("{key} must be a number")))
            })
            .transpose()
    }

    /// A number that must be finite and greater than zero when present.
    pub fn positive_number(&self, key: &str) -> Result<Option<f64>> {
        match self.optional_number(key)? {
            Some(number) if !(number.is_finite() && number > 0.0) => Err(
                DocError::invalid_argument(format!("{key} must be greater than 0, got {number}")),
            ),
            other => Ok(other),
        }
    }

    pub fn string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.get(key)
            .map(|value| cells(key, value))
            .transpose()
    }

    pub fn string_grid(&self, key: &str) -> Result<Option<Vec<Vec<String>>>> {
        self.get(key)
            .map(|value| {
                value
                    .as_array()
                    .ok_or_else(|| {
                        DocError::invalid_argument(format!("{key} must be an array of rows"))
                    })?
                    .iter()
                    .map(|row| cells(key, row))
                    .collect()
            })
            .transpose()
    }

    pub fn alignment(&self) -> Result<Option<Alignment>> {
        self.optional_str("alignment")?
            .map(Alignment::parse)
            .transpose()
    }

    pub fn color(&self, key: &str) -> Result<Option<Color>> {
        self.optional_str(key)?.map(Color::parse).transpose()
    }

    pub fn run_format(&self) -> Result<RunFormat> {
        Ok(RunFormat {
            font_name: self
                .optional_str("font_name")?
                .filter(|name| !name.trim().is_empty())
                .map(str::to_string),
            font_size: self.positive_number("font_size")?,
            bold: self.optional_bool("is_bold")?,
            italic: self.optional_bool("is_italic")?,
            underline: self.optional_bool("is_underline")?,
            color: self.color("color")?,
        })
    }

    pub fn paragraph_format(&self) -> Result<ParagraphFormat> {
        let indent = self.optional_number("indent_first_line")?;
        if let Some(indent) = indent
            && !(indent.is_finite() && indent >= 0.0)
        {
            return Err(DocError::invalid_argument(format!(
                "indent_first_line must not be negative, got {indent}"
            )));
        }
        Ok(ParagraphFormat {
            alignment: self.alignment()?,
            first_line_indent_chars: indent,
            line_spacing_pt: self.positive_number("line_spacing")?,
        })
    }
}

/// Row values as strings; numbers and booleans are stringified, `null`
/// becomes an empty cell.
fn cells(key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| DocError::invalid_argument(format!("{key} must be an array")))?;
    items
        .iter()
        .map(|item| match item {
            Value::String(text) => Ok(text.clone()),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            Value::Null => Ok(String::new()),
            _ => Err(DocError::invalid_argument(format!(
                "{key} cells must be strings"
            ))),
        })
        .collect()
}

/// Reads an image file referenced by a tool call. A missing or unreadable
/// source is the caller's mistake, so it maps to `InvalidArgument`.
pub fn read_image_source(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => DocError::invalid_argument(format!(
            "image {} does not exist",
            path.display()
        )),
        _ => DocError::invalid_argument(format!("image {} is unreadable: {err}", path.display())),
    })?;
    if !metadata.is_file() {
        return Err(DocError::invalid_argument(format!(
            "image {} is not a file",
            path.display()
        )));
    }
    if metadata.len() > MAX_INPUT_BYTES {
        return Err(DocError::invalid_argument(format!(
            "image exceeds limit: {} bytes (max {MAX_INPUT_BYTES})",
            metadata.len()
        )));
    }
    fs::read(path).map_err(|err| {
        DocError::invalid_argument(format!("image {} is unreadable: {err}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn arguments_must_be_an_object() {
        let err = ToolArgs::new(&json!([1, 2])).expect_err("error");
        assert!(matches!(err, DocError::InvalidArgument(_)));
    }

    #[test]
    fn required_and_optional_strings() {
        let value = json!({"file_path": "a.docx", "font_name": null, "count": 3});
        let args = ToolArgs::new(&value).expect("args");
        assert_eq!(args.required_str("file_path").expect("path"), "a.docx");
        assert_eq!(args.optional_str("font_name").expect("font"), None);
        assert!(args.required_str("text").is_err());
        assert!(args.required_str("count").is_err());
    }

    #[test]
    fn integers_accept_whole_floats_only() {
        let value = json!({"a": 2, "b": 3.0, "c": 1.5, "d": "4", "e": -1});
        let args = ToolArgs::new(&value).expect("args");
        assert_eq!(args.required_int("a").expect("a"), 2);
        assert_eq!(args.required_int("b").expect("b"), 3);
        assert!(args.required_int("c").is_err());
        assert!(args.required_int("d").is_err());
        assert_eq!(args.required_int("e").expect("e"), -1);
    }

    #[test]
    fn huge_whole_numbers_saturate() {
        let value = json!({"a": 10000000000000000000u64, "b": 1e30, "c": -1e30});
        let args = ToolArgs::new(&value).expect("args");
        assert_eq!(args.required_int("a").expect("a"), i64::MAX);
        assert_eq!(args.required_int("b").expect("b"), i64::MAX);
        assert_eq!(args.required_int("c").expect("c"), i64::MIN);
    }

    #[test]
    fn grid_stringifies_scalars() {
        let value = json!({"data": [["a", 1, true], [null]], "bad": [[{"x": 1}]]});
        let args = ToolArgs::new(&value).expect("args");
        let grid = args.string_grid("data").expect("grid").expect("present");
        assert_eq!(
            grid,
            vec![
                vec!["a".to_string(), "1".to_string(), "true".to_string()],
                vec![String::new()]
            ]
        );
        assert!(args.string_grid("bad").is_err());
        assert_eq!(args.string_grid("missing").expect("absent"), None);
    }

    #[test]
    fn formats_only_carry_supplied_options() {
        let value = json!({"is_bold": true, "alignment": "center", "color": "#00ff00"});
        let args = ToolArgs::new(&value).expect("args");
        let run = args.run_format().expect("run");
        assert_eq!(run.bold, Some(true));
        assert_eq!(run.italic, None);
        assert_eq!(run.font_size, None);
        assert_eq!(run.color.as_ref().map(Color::hex), Some("00FF00"));
        let paragraph = args.paragraph_format().expect("paragraph");
        assert_eq!(paragraph.alignment, Some(Alignment::Center));
        assert_eq!(paragraph.line_spacing_pt, None);
    }

    #[test]
    fn bad_enum_color_and_size_are_invalid_arguments() {
        for value in [
            json!({"alignment": "middle"}),
            json!({"color": "blue"}),
            json!({"font_size": 0}),
            json!({"line_spacing": -3}),
            json!({"indent_first_line": -1}),
        ] {
            let args = ToolArgs::new(&value).expect("args");
            let failed = args.run_format().is_err() || args.paragraph_format().is_err();
            assert!(failed, "{value} should be rejected");
        }
    }

    #[test]
    fn image_source_errors() {
        let dir = tempdir().expect("tempdir");
        let missing = read_image_source(&dir.path().join("none.png")).expect_err("missing");
        assert!(matches!(missing, DocError::InvalidArgument(_)));

        let is_dir = read_image_source(dir.path()).expect_err("dir");
        assert!(matches!(is_dir, DocError::InvalidArgument(_)));

        let large = dir.path().join("large.png");
        let file = File::create(&large).expect("file");
        file.set_len(MAX_INPUT_BYTES + 1).expect("set_len");
        assert!(read_image_source(&large).is_err());
    }

    #[test]
    fn image_source_reads_bytes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("pic.png");
        fs::write(&path, b"bytes").expect("write");
        assert_eq!(read_image_source(&path).expect("read"), b"bytes");
    }
}
