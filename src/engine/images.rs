use super::insert_block;
use crate::docx::Document;
use crate::docx::format::{Alignment, ParagraphFormat};
use crate::docx::media::{self, Extent};
use crate::docx::xml::Element;
use crate::error::{DocError, Result};
use tracing::debug;

/// Display options for a new or replaced picture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub width_inches: Option<f64>,
    pub height_inches: Option<f64>,
    pub alignment: Option<Alignment>,
}

impl Placement {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("width_inches", self.width_inches),
            ("height_inches", self.height_inches),
        ] {
            if let Some(value) = value
                && !(value.is_finite() && value > 0.0)
            {
                return Err(DocError::invalid_argument(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    fn is_sized(&self) -> bool {
        self.width_inches.is_some() || self.height_inches.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedImage {
    pub image_index: usize,
    pub paragraph_index: usize,
    pub rel_id: String,
}

/// Appends a paragraph holding the picture at the end of the body.
pub fn add_image(
    document: &mut Document,
    bytes: Vec<u8>,
    source: &str,
    placement: &Placement,
) -> Result<InsertedImage> {
    let index = document.index();
    let position = index.append_position();
    let paragraph_index = index.paragraph_count();
    insert_picture(document, position, paragraph_index, bytes, source, placement)
}

/// Inserts a paragraph holding the picture directly after paragraph `after`.
pub fn insert_image_after_paragraph(
    document: &mut Document,
    after: i64,
    bytes: Vec<u8>,
    source: &str,
    placement: &Placement,
) -> Result<InsertedImage> {
    let index = document.index();
    let anchor = index.paragraph(after)?;
    let paragraph_index = index.paragraph_rank_at(anchor).unwrap_or_default() + 1;
    insert_picture(document, anchor + 1, paragraph_index, bytes, source, placement)
}

fn insert_picture(
    document: &mut Document,
    position: usize,
    paragraph_index: usize,
    bytes: Vec<u8>,
    source: &str,
    placement: &Placement,
) -> Result<InsertedImage> {
    placement.validate()?;
    let header = media::require_header(&bytes, source)?;
    let extent = Extent::fit(&header, placement.width_inches, placement.height_inches);
    let image_index = document.index().image_count();
    let drawing_id = media::next_drawing_id(document.body());

    let rel_id = document.add_image_part(bytes, header.format);
    let drawing = media::inline_drawing(&rel_id, drawing_id, extent)?;
    let mut paragraph = Element::new("w:p").with_child(Element::new("w:r").with_child(drawing));
    ParagraphFormat {
        alignment: placement.alignment,
        ..ParagraphFormat::default()
    }
    .apply(&mut paragraph, super::DEFAULT_FONT_SIZE_PT);
    insert_block(document, position, paragraph);

    debug!(
        rel_id = %rel_id,
        image_index,
        paragraph_index,
        format = header.format.as_str(),
        "image inserted"
    );
    Ok(InsertedImage {
        image_index,
        paragraph_index,
        rel_id,
    })
}

/// Removes image `target`: every run that shows it, its relationship, and
/// its media part once nothing else targets it. Returns the images left.
pub fn delete_image(document: &mut Document, target: i64) -> Result<usize> {
    let index = document.index();
    let rel_id = index.image(target)?.id.clone();

    let removed = remove_runs_showing(document.body_mut(), &rel_id);
    document.remove_relationship(&rel_id);
    debug!(rel_id = %rel_id, runs = removed, "image deleted");
    Ok(index.image_count() - 1)
}

/// Swaps the bytes behind image `target`, keeping its relationship id and
/// therefore its rank and every paragraph that shows it. The displayed size
/// changes only when `placement` carries one.
pub fn replace_image(
    document: &mut Document,
    target: i64,
    bytes: Vec<u8>,
    source: &str,
    placement: &Placement,
) -> Result<()> {
    let index = document.index();
    let rel_id = index.image(target)?.id.clone();
    placement.validate()?;
    let header = media::require_header(&bytes, source)?;

    document.replace_image_part(&rel_id, bytes, header.format)?;
    if placement.is_sized() {
        let extent = Extent::fit(&header, placement.width_inches, placement.height_inches);
        resize_drawings(document.body_mut(), &rel_id, extent);
    }
    debug!(rel_id = %rel_id, format = header.format.as_str(), "image replaced");
    Ok(())
}

fn shows(element: &Element, rel_id: &str) -> bool {
    media::referenced_image_ids(element).contains(&rel_id)
}

fn remove_runs_showing(element: &mut Element, rel_id: &str) -> usize {
    let before = element.elements().count();
    element.retain_elements(|child| !(child.is("w:r") && shows(child, rel_id)));
    let mut removed = before - element.elements().count();
    for child in element.elements_mut() {
        removed += remove_runs_showing(child, rel_id);
    }
    removed
}

fn resize_drawings(element: &mut Element, rel_id: &str, extent: Extent) {
    if element.is("w:drawing") {
        if shows(element, rel_id) {
            extent.write(element);
        }
        return;
    }
    for child in element.elements_mut() {
        resize_drawings(child, rel_id, extent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::media::EMU_PER_PIXEL;
    use crate::engine::inspect;
    use crate::engine::paragraphs;
    use crate::engine::testing::{PNG_1X1, PNG_4X2, document_with, texts};
    use pretty_assertions::assert_eq;

    fn sized(width: f64) -> Placement {
        Placement {
            width_inches: Some(width),
            ..Placement::default()
        }
    }

    #[test]
    fn image_after_last_paragraph_becomes_last_paragraph() {
        let mut doc = document_with(&["a", "b"]);
        let inserted =
            insert_image_after_paragraph(&mut doc, 1, PNG_1X1.to_vec(), "dot.png", &sized(1.0))
                .expect("insert");
        assert_eq!(inserted.paragraph_index, 2);
        assert_eq!(inserted.image_index, 0);

        let info = inspect::images_info(&doc);
        assert_eq!(info.images[0].paragraph_index, Some(2));
        assert_eq!(doc.index().paragraph_count(), 3);
        assert_eq!(texts(&doc), vec!["a", "b", ""]);
    }

    #[test]
    fn image_ranks_follow_relationship_order_not_body_order() {
        let mut doc = document_with(&["a", "b"]);
        add_image(&mut doc, PNG_1X1.to_vec(), "first.png", &Placement::default()).expect("add");
        let second =
            insert_image_after_paragraph(&mut doc, 0, PNG_4X2.to_vec(), "second.png", &Placement::default())
                .expect("insert");
        assert_eq!(second.image_index, 1);

        let info = inspect::images_info(&doc);
        assert_eq!(info.total_images, 2);
        // Body order is a, second, b, first.
        assert_eq!(info.images[0].paragraph_index, Some(3));
        assert_eq!(info.images[1].paragraph_index, Some(1));
        assert_eq!(info.images[1].width_px, Some(4));
    }

    #[test]
    fn native_size_is_used_without_dimensions() {
        let mut doc = document_with(&[]);
        add_image(&mut doc, PNG_4X2.to_vec(), "pic.png", &Placement::default()).expect("add");
        let extent = Extent::read(doc.body()).expect("extent");
        assert_eq!(extent, Extent { cx: 4 * EMU_PER_PIXEL, cy: 2 * EMU_PER_PIXEL });
    }

    #[test]
    fn alignment_is_written_on_the_image_paragraph() {
        let mut doc = document_with(&[]);
        let placement = Placement {
            alignment: Some(Alignment::Center),
            ..Placement::default()
        };
        add_image(&mut doc, PNG_1X1.to_vec(), "dot.png", &placement).expect("add");
        let paragraph = doc.body().child("w:p").expect("paragraph");
        assert_eq!(Alignment::of_paragraph(paragraph), Some(Alignment::Center));
    }

    #[test]
    fn invalid_payloads_touch_nothing() {
        let mut doc = document_with(&["a"]);
        let before = doc.body().clone();
        assert!(matches!(
            add_image(&mut doc, b"not an image".to_vec(), "notes.txt", &Placement::default()),
            Err(DocError::InvalidArgument(_))
        ));
        for bad in [0.0, -2.0, f64::NAN] {
            assert!(add_image(&mut doc, PNG_1X1.to_vec(), "dot.png", &sized(bad)).is_err());
        }
        assert!(matches!(
            insert_image_after_paragraph(&mut doc, 5, PNG_1X1.to_vec(), "dot.png", &Placement::default()),
            Err(DocError::IndexOutOfRange { .. })
        ));
        assert_eq!(doc.body(), &before);
        assert_eq!(doc.index().image_count(), 0);
    }

    #[test]
    fn delete_removes_run_relationship_and_media() {
        let mut doc = document_with(&["keep"]);
        add_image(&mut doc, PNG_1X1.to_vec(), "a.png", &Placement::default()).expect("first");
        add_image(&mut doc, PNG_4X2.to_vec(), "b.png", &Placement::default()).expect("second");

        assert_eq!(delete_image(&mut doc, 0).expect("delete"), 1);
        assert!(doc.part("word/media/image1.png").is_none());
        assert!(doc.part("word/media/image2.png").is_some());
        let info = inspect::images_info(&doc);
        assert_eq!(info.images[0].width_px, Some(4));
        assert_eq!(
            media::referenced_image_ids(doc.body()),
            vec![info.images[0].rel_id.as_str()]
        );
        assert!(delete_image(&mut doc, 1).is_err());
    }

    #[test]
    fn replace_keeps_rank_anchor_and_extent_unless_sized() {
        let mut doc = document_with(&["a"]);
        add_image(&mut doc, PNG_1X1.to_vec(), "dot.png", &sized(1.0)).expect("add");
        paragraphs::append_paragraph(&mut doc, "tail", &Default::default()).expect("tail");
        let before = inspect::images_info(&doc).images.remove(0);

        replace_image(&mut doc, 0, PNG_4X2.to_vec(), "wide.png", &Placement::default())
            .expect("replace");
        let after = inspect::images_info(&doc).images.remove(0);
        assert_eq!(after.rel_id, before.rel_id);
        assert_eq!(after.paragraph_index, before.paragraph_index);
        assert_eq!(after.width_inches, before.width_inches);
        assert_eq!(after.width_px, Some(4));

        replace_image(&mut doc, 0, PNG_4X2.to_vec(), "wide.png", &sized(2.0)).expect("resize");
        let resized = inspect::images_info(&doc).images.remove(0);
        assert_eq!(resized.width_inches, Some(2.0));
        assert_eq!(resized.height_inches, Some(1.0));
    }
}
