use super::{ModalAction, ModalComponent};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use image::ImageReader;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{Block, Clear};
use ratatui::Frame;
use std::path::PathBuf;
use tui_textarea::TextArea;

enum Focus {
    Path,
    Ok,
}

enum State {
    None,
    Ok,
    Error,
}

/// Path prompt for attaching a local image, the stand-in for a file picker.
/// The border color tracks whether the typed path is a readable image.
pub struct AttachImageModalComponent {
    path: TextArea<'static>,
    focus: Focus,
    state: State,
}

impl AttachImageModalComponent {
    pub fn new() -> Self {
        let mut path = TextArea::default();
        path.set_block(Block::bordered().title("Path"));
        path.set_cursor_line_style(Style::default());
        path.set_cursor_style(Style::default().reversed());
        Self {
            path,
            focus: Focus::Path,
            state: State::None,
        }
    }

    fn current_path(&self) -> PathBuf {
        PathBuf::from(self.path.lines().join(""))
    }

    fn validate(&mut self) {
        let path = self.current_path();
        self.state = if let Ok(metadata) = path.metadata() {
            if metadata.is_file()
                && ImageReader::open(&path)
                    .ok()
                    .and_then(|reader| reader.decode().ok())
                    .is_some()
            {
                State::Ok
            } else {
                State::Error
            }
        } else {
            State::None
        };
        if let Some(block) = self.path.block() {
            let block = block.clone();
            self.path.set_block(match self.state {
                State::None => block.border_style(Color::Reset),
                State::Ok => block.border_style(Color::Green),
                State::Error => block.border_style(Color::Red),
            });
        }
    }

    fn update_focus(&mut self, focus: Focus) {
        self.focus = focus;
        match self.focus {
            Focus::Path => self.path.set_cursor_style(Style::default().reversed()),
            Focus::Ok => self.path.set_cursor_style(Style::default()),
        }
    }
}

impl ModalComponent for AttachImageModalComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<ModalAction>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(ModalAction::Cancel)),
            KeyCode::Tab | KeyCode::Down => {
                self.update_focus(Focus::Ok);
                return Ok(Some(ModalAction::Render));
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.update_focus(Focus::Path);
                return Ok(Some(ModalAction::Render));
            }
            KeyCode::Enter => {
                return Ok(match self.focus {
                    Focus::Path => {
                        self.update_focus(Focus::Ok);
                        Some(ModalAction::Render)
                    }
                    Focus::Ok => match self.state {
                        State::Ok => Some(ModalAction::Submit(self.current_path())),
                        _ => None,
                    },
                });
            }
            _ => {}
        }
        if matches!(self.focus, Focus::Path) {
            let cursor = self.path.cursor();
            if self.path.input(key) {
                self.validate();
                return Ok(Some(ModalAction::Render));
            } else if self.path.cursor() != cursor {
                return Ok(Some(ModalAction::Render));
            }
        }
        Ok(None)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let area = area.inner(Margin {
            horizontal: 2,
            vertical: 1,
        });
        let [area] = Layout::vertical([Constraint::Length(6)]).areas(area);

        let block = Block::bordered().title("Attach image");
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let [path, ok] = Layout::vertical([Constraint::Length(3), Constraint::Length(1)])
            .areas(inner);
        let mut line = Line::from("OK").centered();
        if matches!(self.state, State::Ok) {
            line = line.blue();
        } else {
            line = line.dim();
        }
        if matches!(self.focus, Focus::Ok) {
            line = line.reversed();
        }
        f.render_widget(&self.path, path);
        f.render_widget(line, ok);
        Ok(())
    }
}
