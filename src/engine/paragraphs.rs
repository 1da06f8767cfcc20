use super::{TextStyle, element_at_mut, insert_block, remove_block};
use crate::docx::Document;
use crate::docx::wml;
use crate::docx::xml::Element;
use crate::error::Result;
use tracing::debug;

/// Appends a paragraph before the section properties; returns its rank.
pub fn append_paragraph(document: &mut Document, text: &str, style: &TextStyle) -> Result<usize> {
    let index = document.index();
    insert_block(document, index.append_position(), build_paragraph(text, style));
    let rank = index.paragraph_count();
    debug!(rank, "paragraph appended");
    Ok(rank)
}

/// Inserts a paragraph directly after paragraph `after`; returns its rank.
pub fn insert_paragraph_after(
    document: &mut Document,
    after: i64,
    text: &str,
    style: &TextStyle,
) -> Result<usize> {
    let index = document.index();
    let anchor = index.paragraph(after)?;
    insert_block(document, anchor + 1, build_paragraph(text, style));

    let rank = index.paragraph_rank_at(anchor).unwrap_or_default() + 1;
    debug!(after, rank, "paragraph inserted");
    Ok(rank)
}

/// Rewrites the content of paragraph `target` in place, keeping its
/// paragraph properties.
pub fn replace_paragraph(
    document: &mut Document,
    target: i64,
    text: &str,
    style: &TextStyle,
) -> Result<usize> {
    let index = document.index();
    let position = index.paragraph(target)?;
    let paragraph = element_at_mut(document.body_mut(), position)?;

    wml::clear_paragraph(paragraph);
    let mut run = wml::new_run(text);
    style.run.apply(&mut run);
    paragraph.push(run);
    style.paragraph.apply(paragraph, style.font_size());

    debug!(target, "paragraph replaced");
    Ok(index.paragraph_rank_at(position).unwrap_or_default())
}

/// Removes paragraph `target`; returns how many paragraphs remain.
pub fn delete_paragraph(document: &mut Document, target: i64) -> Result<usize> {
    let index = document.index();
    let position = index.paragraph(target)?;
    remove_block(document, position);
    debug!(target, "paragraph deleted");
    Ok(index.paragraph_count() - 1)
}

fn build_paragraph(text: &str, style: &TextStyle) -> Element {
    let mut run = wml::new_run(text);
    style.run.apply(&mut run);
    let mut paragraph = Element::new("w:p").with_child(run);
    style.paragraph.apply(&mut paragraph, style.font_size());
    paragraph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::format::{Alignment, ParagraphFormat, RunFormat};
    use crate::engine::inspect;
    use crate::engine::testing::{document_with, texts};
    use crate::error::DocError;
    use pretty_assertions::assert_eq;

    fn plain() -> TextStyle {
        TextStyle::default()
    }

    #[test]
    fn append_goes_before_section_properties() {
        let mut doc = document_with(&["one"]);
        let rank = append_paragraph(&mut doc, "two", &plain()).expect("append");
        assert_eq!(rank, 1);
        assert_eq!(texts(&doc), vec!["one", "two"]);
        let last = doc.body().elements().last().expect("last child");
        assert!(last.is("w:sectPr"));
    }

    #[test]
    fn insert_after_places_new_paragraph_directly_after_anchor() {
        for anchor in 0..3 {
            let mut doc = document_with(&["a", "b", "c"]);
            let rank = insert_paragraph_after(&mut doc, anchor, "new", &plain()).expect("insert");
            let anchor = usize::try_from(anchor).expect("anchor");
            assert_eq!(rank, anchor + 1);

            let after = texts(&doc);
            assert_eq!(after[anchor + 1], "new");
            assert_eq!(after[..=anchor].to_vec(), ["a", "b", "c"][..=anchor].to_vec());
            assert_eq!(after.len(), 4);
        }
    }

    #[test]
    fn insert_after_last_paragraph_becomes_last() {
        let mut doc = document_with(&["a", "b"]);
        insert_paragraph_after(&mut doc, 1, "z", &plain()).expect("insert");
        assert_eq!(texts(&doc).last().map(String::as_str), Some("z"));
    }

    #[test]
    fn insert_after_skips_over_interleaved_tables() {
        let mut doc = document_with(&["a", "b"]);
        crate::engine::tables::insert_table_after_paragraph(&mut doc, 0, 1, 1, &[], false)
            .expect("table");
        let rank = insert_paragraph_after(&mut doc, 0, "x", &plain()).expect("insert");
        assert_eq!(rank, 1);
        assert_eq!(texts(&doc), vec!["a", "x", "b"]);
    }

    #[test]
    fn replace_keeps_position_and_paragraph_properties() {
        let mut doc = document_with(&["a", "b", "c"]);
        let centered = TextStyle {
            paragraph: ParagraphFormat {
                alignment: Some(Alignment::Center),
                ..ParagraphFormat::default()
            },
            ..TextStyle::default()
        };
        replace_paragraph(&mut doc, 1, "first", &centered).expect("center");

        let bold = TextStyle {
            run: RunFormat {
                bold: Some(true),
                ..RunFormat::default()
            },
            ..TextStyle::default()
        };
        let rank = replace_paragraph(&mut doc, 1, "second", &bold).expect("replace");
        assert_eq!(rank, 1);
        assert_eq!(texts(&doc), vec!["a", "second", "c"]);

        let page = inspect::document_structure(&doc, 1, 1, true).expect("structure");
        let paragraph = &page.paragraphs[0];
        assert_eq!(paragraph.alignment, "CENTER");
        assert_eq!(paragraph.runs.len(), 1);
        assert_eq!(paragraph.runs[0].bold, Some(true));
    }

    #[test]
    fn repeated_delete_at_same_index_removes_the_following_element() {
        let mut doc = document_with(&["a", "b", "c", "d"]);
        assert_eq!(delete_paragraph(&mut doc, 1).expect("first delete"), 3);
        assert_eq!(delete_paragraph(&mut doc, 1).expect("second delete"), 2);
        assert_eq!(texts(&doc), vec!["a", "d"]);
    }

    #[test]
    fn out_of_range_leaves_document_untouched() {
        let mut doc = document_with(&["a"]);
        let before = doc.body().clone();
        for bad in [-1, 1, 42] {
            assert!(matches!(
                insert_paragraph_after(&mut doc, bad, "x", &plain()),
                Err(DocError::IndexOutOfRange { .. })
            ));
            assert!(replace_paragraph(&mut doc, bad, "x", &plain()).is_err());
            assert!(delete_paragraph(&mut doc, bad).is_err());
        }
        assert_eq!(doc.body(), &before);
    }

    #[test]
    fn formatting_is_written_only_when_supplied() {
        let mut doc = document_with(&[]);
        append_paragraph(&mut doc, "plain", &plain()).expect("append");
        let paragraph = doc.body().child("w:p").expect("paragraph");
        assert!(paragraph.child("w:pPr").is_none());
        assert!(paragraph.find_descendant("w:rPr").is_none());
    }
}
