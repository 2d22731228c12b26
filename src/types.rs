use crate::document::{BlockId, Embed};
use crate::remote::{TaskId, UploadedFile};
use crossterm::event::{KeyEvent, MouseEvent};
use std::fmt::{Debug, Formatter};

#[derive(Clone)]
pub enum Action {
    Error(String),
    Quit,
    Tick(usize),
    Render,
    NextBlock,
    PrevBlock,
    Enter,
    Back,
    InsertEmbed,
    InsertImages,
    DeleteImage,
    Save,
    ContentChanged,
    Alert(String),
    ShowToolbars,
    RefreshEmbeds,
    EmbedResolved {
        slot: BlockId,
        embed: Option<Embed>,
    },
    PreviewReady {
        task: TaskId,
        container: BlockId,
        data_uri: String,
        width: u32,
        height: u32,
    },
    UploadProgress {
        task: TaskId,
        container: BlockId,
        percent: u8,
    },
    UploadDone {
        task: TaskId,
        container: BlockId,
        file: UploadedFile,
    },
    UploadFailed {
        task: TaskId,
        container: BlockId,
        message: String,
    },
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Error(e) => write!(f, "Error({e})"),
            Action::Quit => write!(f, "Quit"),
            Action::Tick(i) => write!(f, "Tick({i})"),
            Action::Render => write!(f, "Render"),
            Action::NextBlock => write!(f, "NextBlock"),
            Action::PrevBlock => write!(f, "PrevBlock"),
            Action::Enter => write!(f, "Enter"),
            Action::Back => write!(f, "Back"),
            Action::InsertEmbed => write!(f, "InsertEmbed"),
            Action::InsertImages => write!(f, "InsertImages"),
            Action::DeleteImage => write!(f, "DeleteImage"),
            Action::Save => write!(f, "Save"),
            Action::ContentChanged => write!(f, "ContentChanged"),
            Action::Alert(message) => write!(f, "Alert({message})"),
            Action::ShowToolbars => write!(f, "ShowToolbars"),
            Action::RefreshEmbeds => write!(f, "RefreshEmbeds"),
            Action::EmbedResolved { slot, embed } => {
                write!(f, "EmbedResolved({slot:?}, resolved: {})", embed.is_some())
            }
            // the data URI can be hundreds of kilobytes, keep it out of logs
            Action::PreviewReady {
                task,
                container,
                width,
                height,
                ..
            } => write!(f, "PreviewReady({task:?}, {container:?}, {width}x{height})"),
            Action::UploadProgress { task, percent, .. } => {
                write!(f, "UploadProgress({task:?}, {percent}%)")
            }
            Action::UploadDone { task, file, .. } => write!(f, "UploadDone({task:?}, {file:?})"),
            Action::UploadFailed { task, message, .. } => {
                write!(f, "UploadFailed({task:?}, {message})")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Tick(usize),
    Key(KeyEvent),
    Mouse(MouseEvent),
    Error(String),
}
