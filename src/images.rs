use crate::config::EditorConfig;
use crate::document::{BlockId, Document, ImageItem, ImageSource, ItemState};
use crate::hooks::Hooks;
use crate::remote::{Client, TaskId, UploadedFile};
use crate::types::Action;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Owns the image lifecycle: validation, preview, upload, style selection
/// and deletion. Upload completions are correlated back to their placeholder
/// by task id, so concurrent uploads may finish in any order.
pub struct ImagesController {
    action_tx: UnboundedSender<Action>,
    client: Arc<Client>,
    config: EditorConfig,
    hooks: Arc<Hooks>,
    accept: Option<Regex>,
}

impl ImagesController {
    pub fn new(
        action_tx: UnboundedSender<Action>,
        client: Arc<Client>,
        config: EditorConfig,
        hooks: Arc<Hooks>,
    ) -> Self {
        let accept = match config.upload.accept_file_types.as_str() {
            "" => None,
            pattern => match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("invalid accept_file_types pattern: {e}");
                    None
                }
            },
        };
        Self {
            action_tx,
            client,
            config,
            hooks,
            accept,
        }
    }

    /// File-type and size checks. Failures accumulate so one alert can report
    /// everything wrong with the file before any upload starts.
    pub fn validate(&self, path: &Path) -> Vec<String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mut errors = Vec::new();
        if let Some(re) = &self.accept {
            if !re.is_match(&name) {
                errors.push(format!(
                    "{}{name}",
                    self.config.messages.accept_file_types_error
                ));
            }
        }
        if let Some(max) = self.config.upload.max_file_size {
            match std::fs::metadata(path) {
                Ok(metadata) if metadata.len() > max => {
                    errors.push(format!("{}{name}", self.config.messages.max_file_size_error));
                }
                Ok(_) => {}
                Err(e) => errors.push(format!("{name}: {e}")),
            }
        }
        errors
    }

    /// Starts an upload for the given file. Validation failure alerts and
    /// leaves the document untouched; otherwise the container at the cursor
    /// is (re)used and the read/preview/upload pipeline is spawned.
    pub fn attach(&self, doc: &mut Document, path: PathBuf) -> Option<BlockId> {
        let errors = self.validate(&path);
        if !errors.is_empty() {
            self.action_tx.send(Action::Alert(errors.join("\n"))).ok();
            return None;
        }
        let container = doc.ensure_container(&self.config.default_style);
        let task = self.client.task_id();
        if !self.config.preview {
            doc.set_container_progress(container, Some(0));
        }
        self.spawn_pipeline(task, container, path);
        Some(container)
    }

    fn spawn_pipeline(&self, task: TaskId, container: BlockId, path: PathBuf) {
        let tx = self.action_tx.clone();
        let client = Arc::clone(&self.client);
        let preview = self.config.preview;
        let endpoint = self.config.upload.url.clone();
        self.client.spawn(async move {
            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) => {
                    tx.send(Action::UploadFailed {
                        task,
                        container,
                        message: format!("{}: {e}", path.display()),
                    })
                    .ok();
                    return;
                }
            };
            if preview {
                // the preview must be decoded and in the document before the
                // upload request goes out
                match image::load_from_memory(&data) {
                    Ok(decoded) => {
                        let mime = image::guess_format(&data)
                            .map(|format| format.to_mime_type())
                            .unwrap_or("application/octet-stream");
                        let data_uri = format!("data:{mime};base64,{}", STANDARD.encode(&data));
                        tx.send(Action::PreviewReady {
                            task,
                            container,
                            data_uri,
                            width: decoded.width(),
                            height: decoded.height(),
                        })
                        .ok();
                    }
                    Err(e) => {
                        tx.send(Action::UploadFailed {
                            task,
                            container,
                            message: format!("{}: {e}", path.display()),
                        })
                        .ok();
                        return;
                    }
                }
            }
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let progress_tx = tx.clone();
            let result = client
                .upload(&endpoint, &file_name, data, move |percent| {
                    progress_tx
                        .send(Action::UploadProgress {
                            task,
                            container,
                            percent,
                        })
                        .ok();
                })
                .await;
            match result {
                Ok(file) => tx.send(Action::UploadDone {
                    task,
                    container,
                    file,
                }),
                Err(e) => tx.send(Action::UploadFailed {
                    task,
                    container,
                    message: e.to_string(),
                }),
            }
            .ok();
        });
    }

    /// The local file is decoded; render it as a data URI right away while
    /// the upload catches up.
    pub fn insert_preview(
        &self,
        doc: &mut Document,
        task: TaskId,
        container: BlockId,
        data_uri: String,
        width: u32,
        height: u32,
    ) -> bool {
        let pushed = doc.push_item(
            container,
            ImageItem {
                id: None,
                source: ImageSource::Preview(data_uri),
                caption: None,
                state: ItemState::Uploading { task, percent: 0 },
            },
        );
        if pushed {
            if let Some(hook) = &self.hooks.preview_loaded {
                hook(width, height);
            }
        }
        pushed
    }

    pub fn progress(&self, doc: &mut Document, task: TaskId, container: BlockId, percent: u8) {
        if self.config.preview {
            if let Some(item) = doc.item_by_task_mut(task) {
                if let ItemState::Uploading { percent: p, .. } = &mut item.state {
                    *p = percent;
                }
            }
        } else {
            // the indicator disappears once the transfer is complete
            let progress = (percent < 100).then_some(percent);
            doc.set_container_progress(container, progress);
        }
    }

    /// Upload finished. With previews the placeholder's source is swapped in
    /// place; without them a fresh item is built from the response and the
    /// container may switch to the grid layout.
    pub fn finish_upload(
        &self,
        doc: &mut Document,
        task: TaskId,
        container: BlockId,
        file: UploadedFile,
    ) -> bool {
        if self.config.preview {
            let Some(item) = doc.item_by_task_mut(task) else {
                // the placeholder was deleted mid-flight
                return false;
            };
            item.id = Some(file.id.clone());
            item.source = ImageSource::Remote(file.url.clone());
            item.state = ItemState::Stable;
            let item = item.clone();
            if let Some(hook) = &self.hooks.upload_completed {
                hook(&item, &file);
            }
            true
        } else {
            doc.set_container_progress(container, None);
            let item = ImageItem {
                id: Some(file.id.clone()),
                source: ImageSource::Remote(file.url.clone()),
                caption: None,
                state: ItemState::Stable,
            };
            if !doc.push_item(container, item.clone()) {
                return false;
            }
            if doc.auto_grid(container, self.config.auto_grid).is_some() {
                if let Some(c) = doc.container(container) {
                    for name in self.config.styles.keys() {
                        if name != "grid" {
                            self.hooks.style_removed(name, c);
                        }
                    }
                    self.hooks.style_added("grid", c);
                }
            }
            if let Some(hook) = &self.hooks.upload_completed {
                hook(&item, &file);
            }
            true
        }
    }

    /// Upload failed; drop the placeholder and surface the message.
    pub fn fail_upload(
        &self,
        doc: &mut Document,
        task: TaskId,
        container: BlockId,
        message: String,
    ) {
        if self.config.preview {
            doc.remove_item_by_task(task);
        } else {
            doc.set_container_progress(container, None);
        }
        self.action_tx.send(Action::Alert(message)).ok();
    }

    /// Radio-like style selection: the chosen style's added hook fires and
    /// every other configured style's removed hook fires.
    pub fn apply_style(&self, doc: &mut Document, container: BlockId, style: &str) -> bool {
        if doc.apply_style(container, style).is_none() {
            return false;
        }
        if let Some(c) = doc.container(container) {
            for name in self.config.styles.keys() {
                if name != style {
                    self.hooks.style_removed(name, c);
                }
            }
            self.hooks.style_added(style, c);
        }
        true
    }

    /// Removes the selected item and fires the remote delete without waiting
    /// for it.
    pub fn delete_selected(&self, doc: &mut Document) -> bool {
        let Some(item) = doc.delete_selected() else {
            return false;
        };
        let url = self
            .hooks
            .delete_url
            .as_ref()
            .map(|f| f(&item))
            .or_else(|| self.config.delete.url.clone());
        if let Some(url) = url {
            self.client
                .spawn_delete(url, self.config.delete.method.clone());
        }
        true
    }
}
