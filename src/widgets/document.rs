use crate::config::EditorConfig;
use crate::document::{Block, BlockKind, ImageContainer, ImageItem, ImageSource, ItemState, Slot};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Widget;

/// Renders one document block as a run of lines.
///
/// `height` and `render` are driven by the same line builder so the editor
/// can lay blocks out before drawing them.
pub struct BlockWidget<'a> {
    block: &'a Block,
    config: &'a EditorConfig,
    focused: bool,
    selected_item: Option<usize>,
    caption_input: Option<&'a str>,
}

impl<'a> BlockWidget<'a> {
    pub fn new(block: &'a Block, config: &'a EditorConfig) -> Self {
        Self {
            block,
            config,
            focused: false,
            selected_item: None,
            caption_input: None,
        }
    }
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
    /// Index of the selected item when this block is the selected container.
    pub fn selected_item(mut self, item: Option<usize>) -> Self {
        self.selected_item = item;
        self
    }
    /// Caption text being edited for the selected item, shown live in place
    /// of the stored caption.
    pub fn caption_input(mut self, text: Option<&'a str>) -> Self {
        self.caption_input = text;
        self
    }

    pub fn height(&self, width: u16) -> u16 {
        self.lines(width).len() as u16
    }

    /// Row of each image item relative to the block top, for mouse
    /// hit-testing. Empty for non-image blocks.
    pub fn item_rows(&self) -> Vec<u16> {
        let BlockKind::Images(container) = &self.block.kind else {
            return Vec::new();
        };
        let mut row = 1 + u16::from(container.progress.is_some());
        let mut rows = Vec::with_capacity(container.items.len());
        for (i, item) in container.items.iter().enumerate() {
            rows.push(row);
            row += 1;
            if self.caption_line(item, self.selected_item == Some(i)).is_some() {
                row += 1;
            }
        }
        rows
    }

    fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let wrap_width = width.saturating_sub(2).max(1) as usize;
        match &self.block.kind {
            BlockKind::Paragraph(text) => self.paragraph_lines(text, wrap_width),
            BlockKind::Slot(slot) => self.slot_lines(slot),
            BlockKind::Embed(embed) => {
                let marker = self.marker();
                vec![
                    Line::from(vec![
                        marker,
                        Span::from("Embed ").style(Style::default().dim()),
                        Span::from(embed.url.clone()),
                    ]),
                    Line::from(vec![
                        Span::from("  "),
                        Span::from(first_tag(&embed.html)).style(Style::default().dim()),
                    ]),
                ]
            }
            BlockKind::Images(container) => self.image_lines(container),
        }
    }

    fn marker(&self) -> Span<'a> {
        if self.focused {
            Span::from("> ").style(Style::default().fg(Color::Cyan).bold())
        } else {
            Span::from("  ")
        }
    }

    fn paragraph_lines(&self, text: &str, wrap_width: usize) -> Vec<Line<'a>> {
        if text.is_empty() {
            return vec![Line::from(self.marker())];
        }
        let mut lines = Vec::new();
        for (i, wrapped) in textwrap::wrap(text, wrap_width).iter().enumerate() {
            let prefix = if i == 0 {
                self.marker()
            } else {
                Span::from("  ")
            };
            lines.push(Line::from(vec![prefix, Span::from(wrapped.to_string())]));
        }
        lines
    }

    fn slot_lines(&self, slot: &Slot) -> Vec<Line<'a>> {
        let marker = self.marker();
        let line = if slot.placeholder_visible() {
            Line::from(vec![
                marker,
                Span::from(self.config.placeholder.clone()).style(Style::default().dim().italic()),
            ])
        } else {
            let mut spans = vec![marker, Span::from(slot.text.clone())];
            if slot.state == crate::document::SlotState::Resolving {
                spans.push(Span::from(" (resolving)").style(Style::default().dim()));
            }
            Line::from(spans)
        };
        vec![line]
    }

    fn image_lines(&self, container: &ImageContainer) -> Vec<Line<'a>> {
        let mut lines = vec![Line::from(vec![
            self.marker(),
            Span::from("Images ").style(Style::default().dim()),
            Span::from(format!("[{}]", container.style))
                .style(Style::default().fg(Color::Yellow)),
        ])];
        if let Some(percent) = container.progress {
            lines.push(Line::from(vec![
                Span::from("  "),
                Span::from(progress_bar(percent)).style(Style::default().fg(Color::Green)),
                Span::from(format!(" {percent}%")).style(Style::default().dim()),
            ]));
        }
        for (i, item) in container.items.iter().enumerate() {
            let selected = self.selected_item == Some(i);
            lines.push(self.item_line(item, selected));
            lines.extend(self.caption_line(item, selected));
        }
        lines
    }

    fn item_line(&self, item: &ImageItem, selected: bool) -> Line<'a> {
        let bullet = if selected {
            Span::from("  * ").style(Style::default().fg(Color::Cyan).bold())
        } else {
            Span::from("  - ")
        };
        let source = match &item.source {
            ImageSource::Preview(_) => {
                Span::from("(local preview)").style(Style::default().dim().italic())
            }
            ImageSource::Remote(url) => Span::from(url.clone()),
        };
        let mut spans = vec![bullet, source];
        if let ItemState::Uploading { percent, .. } = item.state {
            spans.push(
                Span::from(format!(" {} {percent}%", progress_bar(percent)))
                    .style(Style::default().fg(Color::Green)),
            );
        }
        Line::from(spans)
    }

    fn caption_line(&self, item: &ImageItem, selected: bool) -> Option<Line<'a>> {
        if !self.config.captions {
            return None;
        }
        if selected {
            if let Some(input) = self.caption_input {
                return Some(if input.is_empty() {
                    Line::from(vec![
                        Span::from("    "),
                        Span::from(self.config.caption_placeholder.clone())
                            .style(Style::default().dim().italic()),
                    ])
                } else {
                    Line::from(vec![Span::from("    "), Span::from(input.to_string())])
                });
            }
        }
        let caption = item.caption.as_deref().filter(|c| !c.trim().is_empty())?;
        Some(Line::from(vec![
            Span::from("    "),
            Span::from(caption.to_string()).style(Style::default().dim()),
        ]))
    }
}

impl Widget for BlockWidget<'_> {
    fn render(self, area: Rect, buffer: &mut Buffer) {
        Text::from(self.lines(area.width)).render(area, buffer);
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent.min(100) as usize) / 10;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

fn first_tag(html: &str) -> String {
    let tag = html.split('>').next().unwrap_or(html);
    let mut summary = tag.trim().to_string();
    if !summary.is_empty() {
        summary.push('>');
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn config() -> EditorConfig {
        EditorConfig::default()
    }

    #[test]
    fn slot_shows_placeholder_only_while_empty() {
        let config = config();
        let mut doc = Document::new();
        doc.activate_slot();
        let widget = BlockWidget::new(doc.current(), &config).focused(true);
        let lines = widget.lines(80);
        let text = lines[0]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect::<String>();
        assert!(text.contains(&config.placeholder));

        doc.current_slot_mut().expect("slot").insert('h');
        let widget = BlockWidget::new(doc.current(), &config).focused(true);
        let text = widget.lines(80)[0]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect::<String>();
        assert!(!text.contains(&config.placeholder));
        assert!(text.contains('h'));
    }

    #[test]
    fn height_matches_wrapped_paragraph() {
        let config = config();
        let mut doc = Document::new();
        for c in "word ".repeat(20).trim_end().chars() {
            doc.paragraph_insert(c);
        }
        let widget = BlockWidget::new(doc.current(), &config);
        // 100 chars of text at a narrow width must wrap to several lines
        assert!(widget.height(20) > 1);
        assert_eq!(widget.height(200), 1);
    }

    #[test]
    fn container_progress_renders_without_items() {
        let config = config();
        let mut doc = Document::new();
        let container = doc.ensure_container("wide");
        doc.set_container_progress(container, Some(40));
        let widget = BlockWidget::new(doc.current(), &config);
        let lines = widget.lines(80);
        assert_eq!(lines.len(), 2);
        let text = lines[1]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect::<String>();
        assert!(text.contains("40%"));
    }
}
