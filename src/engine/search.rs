use crate::docx::Document;
use crate::docx::wml;
use crate::docx::xml::{Element, Node};
use crate::error::{DocError, Result};
use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub paragraphs_modified: usize,
    pub replacements_made: usize,
}

enum Matcher<'a> {
    Exact(&'a str),
    IgnoreCase(Regex),
}

impl Matcher<'_> {
    /// Replaces every match in `text`; `None` when nothing matched.
    fn replace(&self, text: &str, replacement: &str) -> Option<(String, usize)> {
        let count = match self {
            Matcher::Exact(needle) => text.matches(*needle).count(),
            Matcher::IgnoreCase(regex) => regex.find_iter(text).count(),
        };
        if count == 0 {
            return None;
        }
        let replaced = match self {
            Matcher::Exact(needle) => text.replace(*needle, replacement),
            Matcher::IgnoreCase(regex) => regex.replace_all(text, NoExpand(replacement)).into_owned(),
        };
        Some((replaced, count))
    }
}

/// Replaces `search` with `replacement` inside each text node of every run,
/// first in top-level paragraphs and then in table cells. Matches spanning
/// two runs are not found.
pub fn search_and_replace(
    document: &mut Document,
    search: &str,
    replacement: &str,
    match_case: bool,
) -> Result<SearchOutcome> {
    if search.is_empty() {
        return Err(DocError::invalid_argument("search_text must not be empty"));
    }
    let matcher = if match_case {
        Matcher::Exact(search)
    } else {
        let regex = RegexBuilder::new(&regex::escape(search))
            .case_insensitive(true)
            .build()
            .map_err(|err| DocError::invalid_argument(format!("unusable search_text: {err}")))?;
        Matcher::IgnoreCase(regex)
    };

    let mut outcome = SearchOutcome::default();
    let body = document.body_mut();
    for paragraph in body.children_named_mut("w:p") {
        replace_in_paragraph(paragraph, &matcher, replacement, &mut outcome);
    }
    for table in body.children_named_mut("w:tbl") {
        visit_cell_paragraphs(table, &mut |paragraph| {
            replace_in_paragraph(paragraph, &matcher, replacement, &mut outcome);
        });
    }

    debug!(
        paragraphs = outcome.paragraphs_modified,
        replacements = outcome.replacements_made,
        match_case,
        "search and replace finished"
    );
    Ok(outcome)
}

fn replace_in_paragraph(
    paragraph: &mut Element,
    matcher: &Matcher<'_>,
    replacement: &str,
    outcome: &mut SearchOutcome,
) {
    let mut replaced_here = 0;
    wml::for_each_run_mut(paragraph, &mut |run| {
        for node in std::mem::take(&mut run.children) {
            let Node::Element(text) = node else {
                run.children.push(node);
                continue;
            };
            if !text.is("w:t") {
                run.children.push(Node::Element(text));
                continue;
            }
            match matcher.replace(&text.text(), replacement) {
                Some((replaced, count)) => {
                    replaced_here += count;
                    run.children
                        .extend(wml::run_content(&replaced).into_iter().map(Node::Element));
                }
                None => run.children.push(Node::Element(text)),
            }
        }
    });
    if replaced_here > 0 {
        outcome.paragraphs_modified += 1;
        outcome.replacements_made += replaced_here;
    }
}

/// Calls `f` on every paragraph inside the table, nested tables included.
fn visit_cell_paragraphs(element: &mut Element, f: &mut impl FnMut(&mut Element)) {
    for child in element.elements_mut() {
        if child.is("w:p") {
            f(child);
        } else {
            visit_cell_paragraphs(child, f);
        }
    }
}
