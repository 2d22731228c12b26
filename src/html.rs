use crate::document::{Block, BlockKind, Document, ImageContainer};
use std::fmt::Write;

/// Renders the document as an HTML fragment.
///
/// Only content survives: paragraphs, committed embeds and image figures.
/// Editing affordances such as URL slots, placeholders, progress indicators
/// and selection state never appear in the output.
pub fn render(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.blocks() {
        render_block(&mut out, block);
    }
    out
}

fn render_block(out: &mut String, block: &Block) {
    match &block.kind {
        BlockKind::Paragraph(text) => {
            if text.trim().is_empty() {
                out.push_str("<p><br></p>\n");
            } else {
                let _ = writeln!(out, "<p>{}</p>", escape_text(text));
            }
        }
        // a slot is an editing affordance, it has no serialized form
        BlockKind::Slot(_) => {}
        BlockKind::Embed(embed) => {
            // provider html is trusted as-is, it already passed the tag gate
            let _ = writeln!(
                out,
                "<div class=\"medium-insert-embeds\">\n\
                 <figure><div class=\"medium-insert-embed\">{}</div></figure>\n\
                 </div>",
                embed.html
            );
        }
        BlockKind::Images(container) => render_images(out, container),
    }
}

fn render_images(out: &mut String, container: &ImageContainer) {
    let _ = writeln!(
        out,
        "<div class=\"medium-insert-images medium-insert-images-{}\">",
        escape_attr(&container.style)
    );
    for item in &container.items {
        out.push_str("<figure>");
        match &item.id {
            Some(id) => {
                let _ = write!(
                    out,
                    "<img src=\"{}\" alt=\"\" img-id=\"{}\">",
                    escape_attr(item.source.url()),
                    escape_attr(id)
                );
            }
            None => {
                let _ = write!(
                    out,
                    "<img src=\"{}\" alt=\"\">",
                    escape_attr(item.source.url())
                );
            }
        }
        if let Some(caption) = item.caption.as_deref().filter(|c| !c.trim().is_empty()) {
            let _ = write!(out, "<figcaption>{}</figcaption>", escape_text(caption));
        }
        out.push_str("</figure>\n");
    }
    out.push_str("</div>\n");
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Embed, EmbedKind, ImageItem, ImageSource, ItemState};
    use crate::remote::TaskId;

    #[test]
    fn empty_document_is_a_single_blank_line() {
        assert_eq!(render(&Document::new()), "<p><br></p>\n");
    }

    #[test]
    fn paragraph_text_is_escaped() {
        let mut doc = Document::new();
        for c in "a < b & c".chars() {
            doc.paragraph_insert(c);
        }
        assert_eq!(render(&doc), "<p>a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn slots_are_stripped_from_output() {
        let mut doc = Document::new();
        doc.activate_slot();
        doc.current_slot_mut().expect("slot").insert('h');
        assert_eq!(render(&doc), "");
    }

    #[test]
    fn committed_embed_gets_wrapper_markup() {
        let mut doc = Document::new();
        doc.activate_slot();
        doc.current_slot_mut().expect("slot").insert('x');
        let (slot, _) = doc.begin_resolve().expect("resolving");
        doc.commit_embed(slot, Embed {
            html: "<iframe src=\"//player.vimeo.com/video/1\"></iframe>".into(),
            kind: EmbedKind::Rich,
            url: "https://vimeo.com/1".into(),
        });
        let html = render(&doc);
        assert!(html.starts_with("<div class=\"medium-insert-embeds\">"));
        assert!(html.contains(
            "<div class=\"medium-insert-embed\"><iframe src=\"//player.vimeo.com/video/1\"></iframe></div>"
        ));
    }

    #[test]
    fn images_render_figures_with_style_class_and_captions() {
        let mut doc = Document::new();
        let container = doc.ensure_container("wide");
        doc.push_item(
            container,
            ImageItem {
                id: Some("42".into()),
                source: ImageSource::Remote("https://cdn.example.com/42.jpg".into()),
                caption: Some("sunset".into()),
                state: ItemState::Stable,
            },
        );
        doc.push_item(
            container,
            ImageItem {
                id: Some("43".into()),
                source: ImageSource::Remote("https://cdn.example.com/43.jpg".into()),
                caption: None,
                state: ItemState::Stable,
            },
        );
        let html = render(&doc);
        assert!(html.contains("class=\"medium-insert-images medium-insert-images-wide\""));
        assert!(html.contains(
            "<figure><img src=\"https://cdn.example.com/42.jpg\" alt=\"\" img-id=\"42\"><figcaption>sunset</figcaption></figure>"
        ));
        assert!(html.contains(
            "<figure><img src=\"https://cdn.example.com/43.jpg\" alt=\"\" img-id=\"43\"></figure>"
        ));
    }

    #[test]
    fn uploading_preview_keeps_image_but_no_progress_markup() {
        let mut doc = Document::new();
        let container = doc.ensure_container("wide");
        doc.push_item(
            container,
            ImageItem {
                id: None,
                source: ImageSource::Preview("data:image/png;base64,AAAA".into()),
                caption: None,
                state: ItemState::Uploading {
                    task: TaskId::for_tests(1),
                    percent: 40,
                },
            },
        );
        let html = render(&doc);
        assert!(html.contains("<img src=\"data:image/png;base64,AAAA\" alt=\"\">"));
        assert!(!html.contains("progress"));
        assert!(!html.contains("40"));
    }
}
