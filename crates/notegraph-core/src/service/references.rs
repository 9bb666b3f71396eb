//! Rewriting links after a note or file changes its slug

use notegraph_parser::{parse, serialize, sluggify, Span};

/// Rewrite every link to `old_slug` in `content` so it points at `new_slug`
///
/// Slashlinks become `/new_slug`. Wikilinks are only rewritten when
/// `wikilink_title` is given, that is when the renamed object is a note.
/// They become `[[title]]` if the title still sluggifies to the new slug,
/// and `[[new_slug]]` otherwise. Returns `None` if nothing changed.
pub(crate) fn rewrite_references(
    content: &str,
    old_slug: &str,
    new_slug: &str,
    wikilink_title: Option<&str>,
) -> Option<String> {
    let wikilink_text = wikilink_title.map(|title| {
        if sluggify(title) == new_slug {
            format!("[[{title}]]")
        } else {
            format!("[[{new_slug}]]")
        }
    });

    let mut blocks = parse(content);
    let mut changed = false;
    for spans in blocks.iter_mut().filter_map(|block| block.spans_mut()) {
        for span in spans.iter_mut() {
            let replacement = match &*span {
                Span::Slashlink(_) if span.link_target().as_deref() == Some(old_slug) => {
                    Some(Span::Slashlink(format!("/{new_slug}")))
                }
                Span::Wikilink(_) if span.link_target().as_deref() == Some(old_slug) => {
                    wikilink_text.clone().map(Span::Wikilink)
                }
                _ => None,
            };
            if let Some(replacement) = replacement {
                *span = replacement;
                changed = true;
            }
        }
    }

    changed.then(|| serialize(&blocks))
}
