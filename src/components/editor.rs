use super::modals::{AttachImageModalComponent, ModalAction, ModalComponent};
use super::Component;
use crate::config::{Config, EditorAction, EditorConfig, Key};
use crate::document::{BlockId, BlockKind, Document};
use crate::embeds::EmbedsController;
use crate::hooks::Hooks;
use crate::html;
use crate::images::ImagesController;
use crate::remote::Client;
use crate::types::Action;
use crate::widgets::document::BlockWidget;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::Clear;
use ratatui::Frame;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Delay before the floating toolbars appear over a fresh selection.
const TOOLBAR_DELAY: Duration = Duration::from_millis(50);
/// Footer alerts stay up for this many ticks.
const ALERT_TICKS: usize = 5;

#[derive(Clone)]
enum Hit {
    Block(BlockId),
    Item(BlockId, usize),
    Style(BlockId, String),
    ActionButton(BlockId, String),
}

struct Alert {
    message: String,
    expires: usize,
}

/// The document view. Owns the model and both addon controllers; async
/// results come back in through `update` as actions.
pub struct EditorComponent {
    action_tx: UnboundedSender<Action>,
    config: EditorConfig,
    keybindings: HashMap<Key, EditorAction>,
    doc: Document,
    embeds: EmbedsController,
    images: ImagesController,
    hooks: Arc<Hooks>,
    modal: Option<AttachImageModalComponent>,
    alert: Option<Alert>,
    tick: usize,
    toolbars: bool,
    offset: usize,
    hits: Vec<(Rect, Hit)>,
    output: PathBuf,
    saved_revision: u64,
}

impl EditorComponent {
    pub fn new(
        action_tx: UnboundedSender<Action>,
        config: &Config,
        hooks: Hooks,
        output: PathBuf,
    ) -> Result<Self> {
        let client = Arc::new(Client::new()?);
        let hooks = Arc::new(hooks);
        let embeds = EmbedsController::new(
            action_tx.clone(),
            Arc::clone(&client),
            config.editor.clone(),
        );
        let images = ImagesController::new(
            action_tx.clone(),
            Arc::clone(&client),
            config.editor.clone(),
            Arc::clone(&hooks),
        );
        Ok(Self {
            action_tx,
            config: config.editor.clone(),
            keybindings: config.keybindings.editor.clone(),
            doc: Document::new(),
            embeds,
            images,
            hooks,
            modal: None,
            alert: None,
            tick: 0,
            toolbars: false,
            offset: 0,
            hits: Vec::new(),
            output,
            saved_revision: 0,
        })
    }

    /// Writes the rendered document out when it changed since the last save.
    pub fn save(&mut self) -> Result<bool> {
        if self.doc.revision() == self.saved_revision {
            return Ok(false);
        }
        std::fs::write(&self.output, html::render(&self.doc))?;
        self.saved_revision = self.doc.revision();
        log::info!("saved to {}", self.output.display());
        Ok(true)
    }

    fn show_alert(&mut self, message: String) {
        self.alert = Some(Alert {
            message,
            expires: self.tick + ALERT_TICKS,
        });
    }

    /// Selections get their toolbars after a short delay, matching the
    /// original's deferred positioning.
    fn arm_toolbars(&mut self) {
        self.toolbars = false;
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOOLBAR_DELAY).await;
            tx.send(Action::ShowToolbars).ok();
        });
    }

    fn select_item(&mut self, container: BlockId, item: usize) -> Option<Action> {
        if self.doc.select(container, item) {
            self.doc.cursor_to(container);
            self.arm_toolbars();
            Some(Action::Render)
        } else {
            None
        }
    }

    fn clear_selection(&mut self) -> Option<Action> {
        self.doc.clear_selection();
        self.toolbars = false;
        Some(Action::Render)
    }

    fn enter(&mut self) -> Result<Option<Action>> {
        match &self.doc.current().kind {
            BlockKind::Slot(_) => {
                self.embeds.process_enter(&mut self.doc)?;
                Ok(Some(Action::Render))
            }
            BlockKind::Images(container) => {
                if container.items.is_empty() {
                    return Ok(None);
                }
                let id = self.doc.current().id;
                Ok(self.select_item(id, 0))
            }
            _ => {
                self.doc.insert_paragraph_below();
                Ok(Some(Action::ContentChanged))
            }
        }
    }

    fn back(&mut self) -> Result<Option<Action>> {
        match &self.doc.current().kind {
            BlockKind::Slot(_) => {
                let abandon = self
                    .doc
                    .current_slot_mut()
                    .is_some_and(|slot| slot.backspace());
                if abandon {
                    self.doc.abandon_slot();
                }
                Ok(Some(Action::Render))
            }
            BlockKind::Embed(_) => {
                self.doc.delete_current_embed();
                Ok(Some(Action::ContentChanged))
            }
            BlockKind::Paragraph(_) => {
                self.doc.paragraph_backspace();
                Ok(Some(Action::ContentChanged))
            }
            BlockKind::Images(_) => Ok(None),
        }
    }

    fn handle_selection_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => Ok(self.clear_selection()),
            (KeyCode::Up, KeyModifiers::NONE) | (KeyCode::Down, KeyModifiers::NONE) => {
                self.clear_selection();
                self.doc
                    .move_cursor(if key.code == KeyCode::Up { -1 } else { 1 });
                Ok(Some(Action::Render))
            }
            (KeyCode::Delete, _) => Ok(self
                .doc
                .selected_item()
                .and_then(|item| self.hooks.action("remove")?.clicked(item))),
            (KeyCode::Left, KeyModifiers::ALT) => {
                Ok(self.doc.move_selected(-1).then_some(Action::ContentChanged))
            }
            (KeyCode::Right, KeyModifiers::ALT) => {
                Ok(self.doc.move_selected(1).then_some(Action::ContentChanged))
            }
            (KeyCode::Tab, _) => {
                let Some(selection) = self.doc.selection() else {
                    return Ok(None);
                };
                let len = self
                    .doc
                    .container(selection.container)
                    .map_or(0, |c| c.items.len());
                if len == 0 {
                    return Ok(None);
                }
                Ok(self.select_item(selection.container, (selection.item + 1) % len))
            }
            (KeyCode::Char(c), KeyModifiers::ALT) if c.is_ascii_digit() => {
                let Some(selection) = self.doc.selection() else {
                    return Ok(None);
                };
                let index = (c as usize).wrapping_sub('1' as usize);
                let Some(style) = self.config.styles.keys().nth(index).cloned() else {
                    return Ok(None);
                };
                Ok(self
                    .images
                    .apply_style(&mut self.doc, selection.container, &style)
                    .then_some(Action::ContentChanged))
            }
            (KeyCode::Backspace, _) => {
                // with caption text under edit, Backspace erases a character;
                // otherwise it removes the selected image like Delete
                if self.config.captions {
                    if let Some(item) = self.doc.selected_item_mut() {
                        if let Some(caption) = &mut item.caption {
                            if caption.pop().is_some() {
                                return Ok(Some(Action::ContentChanged));
                            }
                        }
                    }
                }
                Ok(self
                    .doc
                    .selected_item()
                    .and_then(|item| self.hooks.action("remove")?.clicked(item)))
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT)
                if self.config.captions =>
            {
                if let Some(item) = self.doc.selected_item_mut() {
                    item.caption.get_or_insert_with(String::new).push(c);
                    return Ok(Some(Action::ContentChanged));
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn handle_block_key(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.enter(),
            (KeyCode::Backspace, _) => self.back(),
            (KeyCode::Up, KeyModifiers::NONE) => {
                self.doc.move_cursor(-1);
                Ok(Some(Action::Render))
            }
            (KeyCode::Down, KeyModifiers::NONE) => {
                self.doc.move_cursor(1);
                Ok(Some(Action::Render))
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                match &self.doc.current().kind {
                    BlockKind::Paragraph(_) => {
                        self.doc.paragraph_insert(c);
                        Ok(Some(Action::ContentChanged))
                    }
                    BlockKind::Slot(_) => {
                        if let Some(slot) = self.doc.current_slot_mut() {
                            slot.insert(c);
                        }
                        Ok(Some(Action::Render))
                    }
                    BlockKind::Embed(embed) if c == 'o' => {
                        if let Err(e) = open::that(&embed.url) {
                            log::warn!("failed to open {}: {e}", embed.url);
                        }
                        Ok(None)
                    }
                    _ => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) -> Result<Option<Action>> {
        let position = Position::new(column, row);
        // later entries are drawn on top, search them first
        let hit = self
            .hits
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, hit)| hit.clone());
        match hit {
            Some(Hit::Style(container, style)) => Ok(self
                .images
                .apply_style(&mut self.doc, container, &style)
                .then_some(Action::ContentChanged)),
            Some(Hit::ActionButton(_, name)) => Ok(self
                .doc
                .selected_item()
                .and_then(|item| self.hooks.action(&name)?.clicked(item))),
            Some(Hit::Item(container, item)) => Ok(self.select_item(container, item)),
            Some(Hit::Block(id)) => {
                self.clear_selection();
                self.doc.cursor_to(id);
                Ok(Some(Action::Render))
            }
            None => Ok(self.clear_selection()),
        }
    }

    fn draw_toolbars(&mut self, f: &mut Frame<'_>, container: BlockId, anchor: Rect) {
        let Some(c) = self.doc.container(container) else {
            return;
        };
        let mut spans = Vec::new();
        let mut buttons = Vec::new();
        let mut x = anchor.x;
        for (name, style) in &self.config.styles {
            let label = format!(" {} ", style.label);
            let width = label.len() as u16;
            let span = if *name == c.style {
                Span::from(label).style(Style::default().fg(Color::Black).bg(Color::Yellow))
            } else {
                Span::from(label).style(Style::default().fg(Color::Yellow))
            };
            spans.push(span);
            buttons.push((
                Rect::new(x, anchor.y, width, 1),
                Hit::Style(container, name.clone()),
            ));
            x += width;
        }
        spans.push(Span::from(" | ").dim());
        x += 3;
        for (name, action) in self.hooks.actions() {
            let label = format!(" {} ", action.label());
            let width = label.len() as u16;
            spans.push(Span::from(label).style(Style::default().fg(Color::Red)));
            buttons.push((
                Rect::new(x, anchor.y, width, 1),
                Hit::ActionButton(container, name.to_string()),
            ));
            x += width;
        }
        let width = (x - anchor.x).min(anchor.width.max(1));
        let area = Rect::new(anchor.x, anchor.y, width, 1);
        f.render_widget(Clear, area);
        f.render_widget(Line::from(spans), area);
        self.hits.extend(buttons);
    }

    fn scroll_to_cursor(&mut self, width: u16, height: u16) {
        self.offset = self.offset.min(self.doc.cursor());
        loop {
            let mut y = 0u16;
            let mut cursor_bottom = 0u16;
            for (i, block) in self.doc.blocks().iter().enumerate().skip(self.offset) {
                let h = BlockWidget::new(block, &self.config).height(width);
                y = y.saturating_add(h);
                if i == self.doc.cursor() {
                    cursor_bottom = y;
                    break;
                }
            }
            if cursor_bottom <= height || self.offset >= self.doc.cursor() {
                break;
            }
            self.offset += 1;
        }
    }
}

impl Component for EditorComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(modal) = &mut self.modal {
            return Ok(match modal.handle_key_events(key)? {
                Some(ModalAction::Render) => Some(Action::Render),
                Some(ModalAction::Submit(path)) => {
                    self.modal = None;
                    self.images.attach(&mut self.doc, path);
                    Some(Action::Render)
                }
                Some(ModalAction::Cancel) => {
                    self.modal = None;
                    Some(Action::Render)
                }
                None => None,
            });
        }
        if let Some(action) = self.keybindings.get(&Key::from(key)) {
            return Ok(Some(action.into()));
        }
        if self.doc.selection().is_some() {
            self.handle_selection_key(key)
        } else {
            self.handle_block_key(key)
        }
    }

    fn handle_mouse_events(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if self.modal.is_some() {
            return Ok(None);
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.handle_click(mouse.column, mouse.row)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Tick(i) => {
                self.tick = i;
                if let Some(alert) = &self.alert {
                    if alert.expires <= i {
                        self.alert = None;
                        return Ok(Some(Action::Render));
                    }
                }
                Ok(None)
            }
            Action::NextBlock => {
                self.clear_selection();
                self.doc.move_cursor(1);
                Ok(Some(Action::Render))
            }
            Action::PrevBlock => {
                self.clear_selection();
                self.doc.move_cursor(-1);
                Ok(Some(Action::Render))
            }
            Action::Enter => self.enter(),
            Action::Back => self.back(),
            Action::InsertEmbed => {
                if !self.doc.current().is_empty_paragraph() {
                    self.doc.insert_paragraph_below();
                }
                Ok(self.doc.activate_slot().then_some(Action::Render))
            }
            Action::InsertImages => {
                self.modal = Some(AttachImageModalComponent::new());
                Ok(Some(Action::Render))
            }
            Action::DeleteImage => Ok(self
                .images
                .delete_selected(&mut self.doc)
                .then(|| {
                    self.toolbars = false;
                    Action::ContentChanged
                })),
            Action::Save => {
                match self.save()? {
                    true => self.show_alert(format!(
                        "Saved to {} at {}",
                        self.output.display(),
                        chrono::Local::now().format("%H:%M:%S")
                    )),
                    false => self.show_alert("No changes to save".into()),
                }
                Ok(Some(Action::Render))
            }
            Action::ContentChanged => Ok(Some(Action::Render)),
            Action::Alert(message) => {
                self.show_alert(message);
                Ok(Some(Action::Render))
            }
            Action::ShowToolbars => {
                self.toolbars = self.doc.selection().is_some();
                Ok(Some(Action::Render))
            }
            Action::RefreshEmbeds => Ok(Some(Action::Render)),
            Action::EmbedResolved { slot, embed } => self.embeds.finish(&mut self.doc, slot, embed),
            Action::PreviewReady {
                task,
                container,
                data_uri,
                width,
                height,
            } => Ok(self
                .images
                .insert_preview(&mut self.doc, task, container, data_uri, width, height)
                .then_some(Action::Render)),
            Action::UploadProgress {
                task,
                container,
                percent,
            } => {
                self.images
                    .progress(&mut self.doc, task, container, percent);
                Ok(Some(Action::Render))
            }
            Action::UploadDone {
                task,
                container,
                file,
            } => Ok(self
                .images
                .finish_upload(&mut self.doc, task, container, file)
                .then_some(Action::ContentChanged)),
            Action::UploadFailed {
                task,
                container,
                message,
            } => {
                self.images
                    .fail_upload(&mut self.doc, task, container, message);
                Ok(Some(Action::Render))
            }
            _ => Ok(None),
        }
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        self.hits.clear();
        let [body, footer] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)])
            .areas(area);
        self.scroll_to_cursor(body.width, body.height);

        let selection = self.doc.selection();
        let mut selected_anchor = None;
        let mut y = body.y;
        for (i, block) in self.doc.blocks().iter().enumerate().skip(self.offset) {
            if y >= body.bottom() {
                break;
            }
            let selected_item = selection
                .filter(|s| s.container == block.id)
                .map(|s| s.item);
            let caption_input = if self.config.captions {
                selection
                    .filter(|s| s.container == block.id)
                    .and_then(|s| self.doc.container(block.id)?.items.get(s.item))
                    .map(|item| item.caption.as_deref().unwrap_or(""))
            } else {
                None
            };
            let widget = BlockWidget::new(block, &self.config)
                .focused(i == self.doc.cursor())
                .selected_item(selected_item)
                .caption_input(caption_input);
            let height = widget.height(body.width).min(body.bottom() - y);
            let rect = Rect::new(body.x, y, body.width, height);
            for (item, row) in widget.item_rows().iter().enumerate() {
                if y + row < body.bottom() {
                    self.hits.push((
                        Rect::new(body.x, y + row, body.width, 1),
                        Hit::Item(block.id, item),
                    ));
                }
            }
            self.hits.push((rect, Hit::Block(block.id)));
            if selected_item.is_some() {
                selected_anchor = Some((block.id, rect));
            }
            f.render_widget(widget, rect);
            y += height;
        }

        if self.toolbars {
            if let Some((container, rect)) = selected_anchor {
                self.draw_toolbars(f, container, rect);
            }
        }

        let footer_line = if let Some(alert) = &self.alert {
            Line::from(alert.message.clone()).style(Style::default().fg(Color::Red))
        } else if selection.is_some() {
            Line::from("Type caption | Alt-1..9 style | Alt-\u{2190}/\u{2192} reorder | Del remove | Esc done")
                .style(Style::default().dim())
        } else {
            Line::from("^E embed | ^G images | ^N/^P blocks | ^S save | ^Q quit")
                .style(Style::default().dim())
        };
        f.render_widget(footer_line, footer);

        if let Some(modal) = &mut self.modal {
            modal.draw(f, area)?;
        }
        Ok(())
    }
}
