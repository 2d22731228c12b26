use crate::components::editor::EditorComponent;
use crate::components::Component;
use crate::config::Config;
use crate::hooks::Hooks;
use crate::tui::{io, Tui};
use crate::types::{Action, Event};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Autosave once a minute of ticks.
const AUTOSAVE_TICKS: usize = 60;

pub struct App {
    config: Config,
    output: PathBuf,
}

impl App {
    pub fn new(config: Config, output: PathBuf) -> Self {
        log::debug!("App::new({config:?}, {})", output.display());
        Self { config, output }
    }
    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        let terminal = Terminal::new(CrosstermBackend::new(io()))?;
        log::debug!("terminal size: {}", terminal.size()?);
        let mut tui = Tui::new(terminal);
        tui.start()?;

        let mut editor = EditorComponent::new(
            action_tx.clone(),
            &self.config,
            Hooks::with_default_actions(),
            self.output.clone(),
        )?;
        editor.init(tui.get_frame().area())?;

        action_tx.send(Action::Render)?;
        let mut should_quit = false;
        loop {
            // wake on terminal events and on actions sent by detached tasks,
            // whichever comes first
            let mut next = tokio::select! {
                event = tui.next_event() => {
                    if let Some(e) = event {
                        if let Some(action) = self.handle_events(e.clone()) {
                            action_tx.send(action)?;
                        }
                        if let Some(action) = editor.handle_events(Some(e))? {
                            action_tx.send(action)?;
                        }
                    }
                    None
                }
                action = action_rx.recv() => action,
            };
            while let Some(action) = next.take().or_else(|| action_rx.try_recv().ok()) {
                if !matches!(action, Action::Tick(_) | Action::Render) {
                    log::info!("Action {action:?}");
                }
                match action {
                    Action::Quit => should_quit = true,
                    Action::Tick(i) => {
                        if i % AUTOSAVE_TICKS == 0 {
                            editor.save()?;
                        }
                        if let Some(action) = editor.update(Action::Tick(i))? {
                            action_tx.send(action)?;
                        }
                    }
                    Action::Error(e) => {
                        log::error!("{e}");
                        action_tx.send(Action::Alert(e))?;
                    }
                    Action::Render => {
                        tui.draw(|f| {
                            let area = f.area();
                            if let Err(e) = editor.draw(f, area) {
                                if let Err(e) =
                                    action_tx.send(Action::Error(format!("failed to draw: {e:?}")))
                                {
                                    log::error!("failed to send error: {e}");
                                }
                            }
                        })?;
                    }
                    _ => {
                        if let Some(action) = editor.update(action)? {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            if should_quit {
                editor.save()?;
                break;
            }
        }
        tui.end()?;
        Ok(())
    }
    fn handle_events(&mut self, event: Event) -> Option<Action> {
        match event {
            Event::Key(key_event) => self.handle_key_events(key_event),
            Event::Tick(i) => Some(Action::Tick(i)),
            Event::Error(e) => Some(Action::Error(e)),
            _ => None,
        }
    }
    fn handle_key_events(&mut self, key_event: KeyEvent) -> Option<Action> {
        self.config
            .keybindings
            .global
            .get(&key_event.into())
            .map(Action::from)
    }
}
