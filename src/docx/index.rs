use super::document::Relationship;
use super::xml::Element;
use crate::error::{Result, checked_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Table,
}

/// A ranked block and its child position inside `w:body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub position: usize,
}

/// Positional view over one state of a document.
///
/// Built from a single pass over the body and the relationship part; any
/// structural edit invalidates it, so callers rebuild it instead of patching.
#[derive(Debug, Clone, Default)]
pub struct StructuralIndex {
    blocks: Vec<Block>,
    paragraphs: Vec<usize>,
    tables: Vec<usize>,
    images: Vec<Relationship>,
    append_position: usize,
}

impl StructuralIndex {
    pub fn build(body: &Element, relationships: &[Relationship]) -> Self {
        let mut index = Self {
            append_position: body.children.len(),
            ..Self::default()
        };

        for (position, node) in body.children.iter().enumerate() {
            let Some(element) = node.as_element() else {
                continue;
            };
            let kind = match element.name.as_str() {
                "w:p" => BlockKind::Paragraph,
                "w:tbl" => BlockKind::Table,
                _ => continue,
            };
            match kind {
                BlockKind::Paragraph => index.paragraphs.push(position),
                BlockKind::Table => index.tables.push(position),
            }
            index.blocks.push(Block { kind, position });
        }

        // sectPr is the last body child when present; new blocks go before it.
        if let Some(position) = body
            .children
            .iter()
            .rposition(|node| node.as_element().is_some_and(|e| e.is("w:sectPr")))
            && index.blocks.last().is_none_or(|block| block.position < position)
        {
            index.append_position = position;
        }

        index.images = relationships
            .iter()
            .filter(|rel| rel.is_image())
            .cloned()
            .collect();
        index
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Body position of paragraph `index`.
    pub fn paragraph(&self, index: i64) -> Result<usize> {
        let rank = checked_index("paragraph", index, self.paragraphs.len())?;
        Ok(self.paragraphs[rank])
    }

    /// Body position of table `index`.
    pub fn table(&self, index: i64) -> Result<usize> {
        let rank = checked_index("table", index, self.tables.len())?;
        Ok(self.tables[rank])
    }

    pub fn image(&self, index: i64) -> Result<&Relationship> {
        let rank = checked_index("image", index, self.images.len())?;
        Ok(&self.images[rank])
    }

    pub fn paragraph_positions(&self) -> &[usize] {
        &self.paragraphs
    }

    pub fn table_positions(&self) -> &[usize] {
        &self.tables
    }

    pub fn images(&self) -> &[Relationship] {
        &self.images
    }

    /// Where a block appended "at the end" goes: just before the trailing
    /// `w:sectPr`, or after the last child.
    pub fn append_position(&self) -> usize {
        self.append_position
    }

    /// Rank of the paragraph sitting at body `position`.
    pub fn paragraph_rank_at(&self, position: usize) -> Option<usize> {
        self.paragraphs.binary_search(&position).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::template::REL_IMAGE;
    use crate::docx::xml::parse;
    use crate::error::DocError;
    use pretty_assertions::assert_eq;

    fn rel(id: &str, rel_type: &str) -> Relationship {
        Relationship {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: format!("media/{id}.png"),
            external: false,
        }
    }

    #[test]
    fn ranks_follow_body_order_per_kind() {
        let body = parse(
            "<w:body><w:p/><w:tbl/><w:bookmarkStart/><w:p/><w:sdt/><w:tbl/><w:p/><w:sectPr/></w:body>",
        )
        .expect("parse");
        let index = StructuralIndex::build(&body, &[]);

        assert_eq!(index.paragraph_positions(), &[0, 3, 6]);
        assert_eq!(index.table_positions(), &[1, 5]);
        assert_eq!(index.append_position(), 7);
        assert_eq!(
            index.blocks().iter().map(|b| b.kind).collect::<Vec<_>>(),
            vec![
                BlockKind::Paragraph,
                BlockKind::Table,
                BlockKind::Paragraph,
                BlockKind::Table,
                BlockKind::Paragraph
            ]
        );
        assert_eq!(index.paragraph(1).expect("p1"), 3);
        assert_eq!(index.paragraph_rank_at(6), Some(2));
        assert_eq!(index.paragraph_rank_at(5), None);
    }

    #[test]
    fn tables_nested_in_cells_are_not_ranked() {
        let body = parse(
            "<w:body><w:p/><w:tbl><w:tr><w:tc><w:p/><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl><w:p/></w:tc></w:tr></w:tbl><w:sectPr/></w:body>",
        )
        .expect("parse");
        let index = StructuralIndex::build(&body, &[]);

        assert_eq!(index.table_count(), 1);
        assert_eq!(index.table_positions(), &[1]);
        assert_eq!(index.paragraph_count(), 1);
        assert!(index.table(1).is_err());
    }

    #[test]
    fn out_of_range_lookups_report_count() {
        let body = parse("<w:body><w:p/><w:sectPr/></w:body>").expect("parse");
        let index = StructuralIndex::build(&body, &[]);
        for bad in [-1, 1, 99] {
            let err = index.paragraph(bad).expect_err("out of range");
            assert!(matches!(
                err,
                DocError::IndexOutOfRange { kind: "paragraph", count: 1, .. }
            ));
        }
        assert!(index.table(0).is_err());
        assert!(index.image(0).is_err());
    }

    #[test]
    fn images_follow_relationship_order() {
        let body = parse("<w:body/>").expect("parse");
        let rels = vec![
            rel("rId4", REL_IMAGE),
            rel("rId1", "http://example.com/styles"),
            rel("rId2", REL_IMAGE),
        ];
        let index = StructuralIndex::build(&body, &rels);
        assert_eq!(index.image_count(), 2);
        assert_eq!(index.image(0).expect("first").id, "rId4");
        assert_eq!(index.image(1).expect("second").id, "rId2");
        assert_eq!(index.append_position(), 0);
    }

    #[test]
    fn missing_section_appends_at_end() {
        let body = parse("<w:body><w:p/><w:p/></w:body>").expect("parse");
        assert_eq!(StructuralIndex::build(&body, &[]).append_position(), 2);
    }
}
