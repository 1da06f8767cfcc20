use super::index::StructuralIndex;
use super::media::ImageFormat;
use super::package::{self, Package};
use super::template::{self, NS_A, NS_PIC, NS_R, NS_WP, REL_IMAGE};
use super::xml::{self, Element, Node};
use crate::error::{DocError, Result};
use crate::mcp::contracts::MAX_INPUT_BYTES;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const STYLES_PART: &str = "word/styles.xml";

const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

impl Relationship {
    pub fn is_image(&self) -> bool {
        self.rel_type == REL_IMAGE
    }

    /// Package part the relationship points at, `None` for linked resources.
    pub fn part_name(&self) -> Option<String> {
        (!self.external).then(|| resolve_target(&self.target))
    }
}

/// In-memory handle on one `.docx` file for the span of a single operation.
///
/// `word/document.xml` is split into the document shell and its `w:body` so
/// the engines can borrow the body directly. Every other part stays in the
/// package as raw bytes and is written back unchanged.
#[derive(Debug)]
pub struct Document {
    package: Package,
    root: Element,
    body_slot: usize,
    body: Element,
    rels: Element,
    content_types: Element,
}

impl Document {
    pub fn blank() -> Result<Self> {
        Self::from_package(template::blank_package())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?)
    }

    fn from_package(package: Package) -> Result<Self> {
        let mut root = xml::parse(part_str(&package, DOCUMENT_PART)?)?;
        if !root.is("w:document") {
            return Err(DocError::invalid_document(format!(
                "{DOCUMENT_PART} root is <{}>, expected <w:document>",
                root.name
            )));
        }
        let body_slot = root
            .position_of("w:body")
            .ok_or_else(|| DocError::invalid_document("document has no w:body"))?;
        let Node::Element(body) = root.children.remove(body_slot) else {
            return Err(DocError::invalid_document("w:body is not an element"));
        };

        let rels = match package.get(DOCUMENT_RELS_PART) {
            Some(_) => xml::parse(part_str(&package, DOCUMENT_RELS_PART)?)?,
            None => Element::new("Relationships").with_attr("xmlns", NS_PACKAGE_RELS),
        };
        let content_types = xml::parse(part_str(&package, CONTENT_TYPES_PART)?)?;

        Ok(Self {
            package,
            root,
            body_slot,
            body,
            rels,
            content_types,
        })
    }

    /// Reads the document at `path`, mapping a missing file to `FileNotFound`
    /// and anything the codec rejects to `InvalidDocument`.
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DocError::FileNotFound(path.to_path_buf()),
            _ => DocError::io(format!("failed to inspect {}", path.display()), err),
        })?;
        if !metadata.is_file() {
            return Err(DocError::invalid_argument(format!(
                "{} is not a file",
                path.display()
            )));
        }
        if metadata.len() > MAX_INPUT_BYTES {
            return Err(DocError::invalid_argument(format!(
                "document exceeds limit: {} bytes (max {MAX_INPUT_BYTES})",
                metadata.len()
            )));
        }
        let bytes = fs::read(path)
            .map_err(|err| DocError::io(format!("failed to read {}", path.display()), err))?;
        let document = Self::from_bytes(&bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "document opened");
        Ok(document)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let body = std::mem::replace(&mut self.body, Element::new("w:body"));
        self.root.children.insert(self.body_slot, Node::Element(body));
        let serialized = xml::to_bytes(&self.root);
        if let Node::Element(body) = self.root.children.remove(self.body_slot) {
            self.body = body;
        }

        self.package.set(DOCUMENT_PART, serialized?);
        self.package
            .set(DOCUMENT_RELS_PART, xml::to_bytes(&self.rels)?);
        self.package
            .set(CONTENT_TYPES_PART, xml::to_bytes(&self.content_types)?);
        self.package.to_bytes()
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        package::write_atomic(path, &bytes)
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    /// Fresh positional view of the current state.
    pub fn index(&self) -> StructuralIndex {
        StructuralIndex::build(&self.body, &self.relationships())
    }

    pub fn relationships(&self) -> Vec<Relationship> {
        self.rels
            .children_named("Relationship")
            .filter_map(|rel| {
                Some(Relationship {
                    id: rel.attr("Id")?.to_string(),
                    rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                    target: rel.attr("Target").unwrap_or_default().to_string(),
                    external: rel.attr("TargetMode") == Some("External"),
                })
            })
            .collect()
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.package.get(name)
    }

    /// Stores `bytes` as a new media part and registers an image relationship
    /// for it; returns the relationship id.
    pub fn add_image_part(&mut self, bytes: Vec<u8>, format: ImageFormat) -> String {
        let part_name = self.unused_media_name(format.extension());
        self.package.set(&part_name, bytes);
        self.ensure_default_content_type(format.extension(), format.content_type());
        let target = part_name
            .strip_prefix("word/")
            .unwrap_or(&part_name)
            .to_string();
        let id = self.next_relationship_id();
        self.rels.push(
            Element::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", REL_IMAGE)
                .with_attr("Target", target),
        );
        self.ensure_drawing_namespaces();
        id
    }

    /// Swaps the bytes behind image relationship `rel_id` without changing
    /// the id, so every run referencing it keeps pointing at it.
    pub fn replace_image_part(
        &mut self,
        rel_id: &str,
        bytes: Vec<u8>,
        format: ImageFormat,
    ) -> Result<()> {
        let rel = self
            .relationships()
            .into_iter()
            .find(|rel| rel.id == rel_id)
            .ok_or_else(|| DocError::invalid_document(format!("relationship {rel_id} missing")))?;

        let old_part = rel.part_name();
        let reusable = old_part.as_deref().is_some_and(|name| {
            extension_of(name).eq_ignore_ascii_case(format.extension())
                && self.part_reference_count(name) == 1
        });
        if let (true, Some(name)) = (reusable, old_part.as_deref()) {
            self.package.set(name, bytes);
            return Ok(());
        }

        let part_name = self.unused_media_name(format.extension());
        self.package.set(&part_name, bytes);
        self.ensure_default_content_type(format.extension(), format.content_type());
        let target = part_name.strip_prefix("word/").unwrap_or(&part_name);
        if let Some(node) = self
            .rels
            .children_named_mut("Relationship")
            .find(|node| node.attr("Id") == Some(rel_id))
        {
            node.set_attr("Target", target);
            node.attrs.retain(|(key, _)| key != "TargetMode");
        }
        if let Some(name) = old_part {
            self.drop_part_if_unreferenced(&name);
        }
        Ok(())
    }

    /// Removes relationship `rel_id` and its media part once nothing else
    /// targets the part.
    pub fn remove_relationship(&mut self, rel_id: &str) {
        let part = self
            .relationships()
            .into_iter()
            .find(|rel| rel.id == rel_id)
            .and_then(|rel| rel.part_name());
        self.rels
            .retain_elements(|node| !(node.is("Relationship") && node.attr("Id") == Some(rel_id)));
        if let Some(name) = part {
            self.drop_part_if_unreferenced(&name);
        }
    }

    /// Style id to display name, read from `word/styles.xml` when present.
    pub fn style_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::new();
        let Some(xml) = self
            .package
            .get(STYLES_PART)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
        else {
            return names;
        };
        let Ok(styles) = xml::parse(xml) else {
            return names;
        };
        for style in styles.children_named("w:style") {
            if let (Some(id), Some(name)) = (
                style.attr("w:styleId"),
                style.child("w:name").and_then(|name| name.attr("w:val")),
            ) {
                names.insert(id.to_string(), name.to_string());
            }
        }
        names
    }

    fn part_reference_count(&self, part_name: &str) -> usize {
        self.relationships()
            .iter()
            .filter(|rel| rel.part_name().as_deref() == Some(part_name))
            .count()
    }

    fn drop_part_if_unreferenced(&mut self, part_name: &str) {
        if self.part_reference_count(part_name) == 0 {
            self.package.remove(part_name);
        }
    }

    fn next_relationship_id(&self) -> String {
        let highest = self
            .relationships()
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("rId{}", highest + 1)
    }

    fn unused_media_name(&self, extension: &str) -> String {
        let mut n = 1u32;
        loop {
            let candidate = format!("word/media/image{n}.{extension}");
            if !self.package.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) {
        let present = self.content_types.children_named("Default").any(|node| {
            node.attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if !present {
            self.content_types.children.insert(
                0,
                Node::Element(
                    Element::new("Default")
                        .with_attr("Extension", extension)
                        .with_attr("ContentType", content_type),
                ),
            );
        }
    }

    /// Inline pictures need the drawing prefixes declared on the root.
    fn ensure_drawing_namespaces(&mut self) {
        for (prefix, uri) in [
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ] {
            if self.root.attr(prefix).is_none() {
                self.root.set_attr(prefix, uri);
            }
        }
    }
}

fn part_str<'a>(package: &'a Package, name: &str) -> Result<&'a str> {
    let bytes = package
        .get(name)
        .ok_or_else(|| DocError::invalid_document(format!("missing part {name}")))?;
    std::str::from_utf8(bytes)
        .map_err(|err| DocError::invalid_document(format!("{name} is not utf-8: {err}")))
}

/// Resolves a relationship target of `word/document.xml` to a package part name.
pub fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = vec!["word"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn extension_of(part_name: &str) -> &str {
    part_name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG_1X1: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89,
    ];

    #[test]
    fn blank_document_has_empty_body_except_section() {
        let doc = Document::blank().expect("blank");
        let names: Vec<&str> = doc.body().elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["w:sectPr"]);
        assert_eq!(doc.index().paragraph_count(), 0);
    }

    #[test]
    fn bytes_round_trip_preserves_body() {
        let mut doc = Document::blank().expect("blank");
        doc.body_mut()
            .children
            .insert(0, Node::Element(Element::new("w:p")));
        let bytes = doc.to_bytes().expect("bytes");
        let reopened = Document::from_bytes(&bytes).expect("reopen");
        assert_eq!(reopened.index().paragraph_count(), 1);
        assert!(reopened.part(STYLES_PART).is_some());
    }

    #[test]
    fn image_parts_get_relationship_and_content_type() {
        let mut doc = Document::blank().expect("blank");
        let first = doc.add_image_part(PNG_1X1.to_vec(), ImageFormat::Png);
        let second = doc.add_image_part(PNG_1X1.to_vec(), ImageFormat::Png);
        assert_eq!(first, "rId2");
        assert_eq!(second, "rId3");
        assert!(doc.part("word/media/image1.png").is_some());
        assert!(doc.part("word/media/image2.png").is_some());

        let bytes = doc.to_bytes().expect("bytes");
        let reopened = Document::from_bytes(&bytes).expect("reopen");
        assert_eq!(reopened.index().image_count(), 2);
        let types = String::from_utf8_lossy(reopened.part(CONTENT_TYPES_PART).expect("types"))
            .into_owned();
        assert!(types.contains(r#"Extension="png""#));
    }

    #[test]
    fn removing_relationship_drops_media() {
        let mut doc = Document::blank().expect("blank");
        let id = doc.add_image_part(PNG_1X1.to_vec(), ImageFormat::Png);
        doc.remove_relationship(&id);
        assert!(doc.part("word/media/image1.png").is_none());
        assert_eq!(doc.index().image_count(), 0);
    }

    #[test]
    fn replacing_with_new_format_retargets_relationship() {
        let mut doc = Document::blank().expect("blank");
        let id = doc.add_image_part(PNG_1X1.to_vec(), ImageFormat::Png);
        doc.replace_image_part(&id, vec![0xFF, 0xD8, 0xFF], ImageFormat::Jpeg)
            .expect("replace");
        let rel = doc
            .relationships()
            .into_iter()
            .find(|rel| rel.id == id)
            .expect("relationship");
        assert_eq!(rel.target, "media/image1.jpeg");
        assert!(doc.part("word/media/image1.png").is_none());
        assert!(doc.part("word/media/image1.jpeg").is_some());
    }

    #[test]
    fn resolve_target_handles_relative_and_absolute() {
        assert_eq!(resolve_target("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("/word/media/x.gif"), "word/media/x.gif");
        assert_eq!(resolve_target("../customXml/item1.xml"), "customXml/item1.xml");
    }
}
