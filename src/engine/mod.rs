//! Positional operations over a [`Document`].
//!
//! Every entry point takes a freshly opened document, builds the structural
//! index once, validates all indices and payloads, and only then edits the
//! body. An `Err` return means the tree was not touched.

pub mod images;
pub mod inspect;
pub mod paragraphs;
pub mod search;
pub mod tables;

use crate::docx::Document;
use crate::docx::format::{ParagraphFormat, RunFormat};
use crate::docx::xml::{Element, Node};
use crate::error::{DocError, Result};

/// Font size assumed when a paragraph format needs one and none is given.
pub const DEFAULT_FONT_SIZE_PT: f64 = 12.0;

/// Formatting supplied alongside new paragraph content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub run: RunFormat,
    pub paragraph: ParagraphFormat,
}

impl TextStyle {
    fn font_size(&self) -> f64 {
        self.run.font_size.unwrap_or(DEFAULT_FONT_SIZE_PT)
    }
}

fn element_at_mut(body: &mut Element, position: usize) -> Result<&mut Element> {
    body.children
        .get_mut(position)
        .and_then(Node::as_element_mut)
        .ok_or_else(|| DocError::invalid_document(format!("no element at body position {position}")))
}

fn insert_block(document: &mut Document, position: usize, block: Element) {
    document
        .body_mut()
        .children
        .insert(position, Node::Element(block));
}

fn remove_block(document: &mut Document, position: usize) {
    document.body_mut().children.remove(position);
}
