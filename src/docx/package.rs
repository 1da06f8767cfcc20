use crate::error::{DocError, Result};
use crate::mcp::contracts::MAX_UNPACKED_BYTES;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// The OPC zip container. Parts keep the order they were read in.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_limited(bytes, MAX_UNPACKED_BYTES)
    }

    /// Unzips every part, refusing packages whose parts add up to more than
    /// `limit` uncompressed bytes.
    fn from_bytes_limited(bytes: &[u8], limit: u64) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| DocError::invalid_document(format!("not a docx package: {err}")))?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut remaining = limit;
        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|err| {
                DocError::invalid_document(format!("unreadable zip entry {i}: {err}"))
            })?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            if file.size() > remaining {
                return Err(unpacked_too_large(&name, limit));
            }

            // Declared sizes can lie; never read more than what is left.
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.take(remaining + 1).read_to_end(&mut data).map_err(|err| {
                DocError::invalid_document(format!("failed to read part {name}: {err}"))
            })?;
            let read = data.len() as u64;
            if read > remaining {
                return Err(unpacked_too_large(&name, limit));
            }
            remaining -= read;
            parts.push(Part { name, data });
        }
        Ok(Self { parts })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|err| zip_write_error(&part.name, err))?;
            writer
                .write_all(&part.data)
                .map_err(|err| DocError::io(format!("failed to write part {}", part.name), err))?;
        }

        let cursor = writer
            .finish()
            .map_err(|err| zip_write_error("central directory", err))?;
        Ok(cursor.into_inner())
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| part.data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.iter().any(|part| part.name == name)
    }

    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.parts.len();
        self.parts.retain(|part| part.name != name);
        self.parts.len() != before
    }
}

fn unpacked_too_large(name: &str, limit: u64) -> DocError {
    DocError::invalid_document(format!(
        "package exceeds limit at part {name}: more than {limit} uncompressed bytes"
    ))
}

fn zip_write_error(what: &str, err: zip::result::ZipError) -> DocError {
    DocError::io(
        format!("failed to write {what}"),
        std::io::Error::other(err.to_string()),
    )
}

/// Writes `bytes` beside `path` and renames the temp file over it, so a failed
/// save never leaves a truncated document behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(path);
    fs::write(&temp_path, bytes)
        .map_err(|err| DocError::io(format!("failed to write {}", temp_path.display()), err))?;

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(DocError::io(
            format!("failed to replace {}", path.display()),
            err,
        ));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "document saved");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}
