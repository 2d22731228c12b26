use crate::document::{ImageContainer, ImageItem};
use crate::remote::UploadedFile;
use crate::types::Action;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Per-style activation/deactivation callbacks. Both default to no-ops so a
/// style entry only has to implement what it cares about.
pub trait StyleHook: Send + Sync {
    #[allow(unused_variables)]
    fn added(&self, container: &ImageContainer) {}
    #[allow(unused_variables)]
    fn removed(&self, container: &ImageContainer) {}
}

/// A button on the floating action toolbar.
pub trait PointAction: Send + Sync {
    fn label(&self) -> &str;
    fn clicked(&self, item: &ImageItem) -> Option<Action>;
}

pub type PreviewLoaded = dyn Fn(u32, u32) + Send + Sync;
pub type UploadCompleted = dyn Fn(&ImageItem, &UploadedFile) + Send + Sync;
pub type DeleteUrl = dyn Fn(&ImageItem) -> String + Send + Sync;

/// Callback surface that cannot be expressed in the TOML config: style and
/// action hooks plus the upload lifecycle notifications.
#[derive(Default)]
pub struct Hooks {
    styles: HashMap<String, Box<dyn StyleHook>>,
    actions: IndexMap<String, Box<dyn PointAction>>,
    pub preview_loaded: Option<Box<PreviewLoaded>>,
    pub upload_completed: Option<Box<UploadCompleted>>,
    /// Computes the delete endpoint from the deleted item, overriding the
    /// configured literal URL.
    pub delete_url: Option<Box<DeleteUrl>>,
}

impl Hooks {
    /// Registry with the stock "remove" action, the counterpart of the
    /// original plugin's default toolbar.
    pub fn with_default_actions() -> Self {
        let mut hooks = Self::default();
        hooks.set_action("remove", Box::new(RemoveAction));
        hooks
    }

    pub fn set_style(&mut self, name: &str, hook: Box<dyn StyleHook>) {
        self.styles.insert(name.to_string(), hook);
    }

    pub fn set_action(&mut self, name: &str, action: Box<dyn PointAction>) {
        self.actions.insert(name.to_string(), action);
    }

    pub fn actions(&self) -> impl Iterator<Item = (&str, &dyn PointAction)> {
        self.actions.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn action(&self, name: &str) -> Option<&dyn PointAction> {
        self.actions.get(name).map(Box::as_ref)
    }

    pub fn style_added(&self, name: &str, container: &ImageContainer) {
        if let Some(hook) = self.styles.get(name) {
            hook.added(container);
        }
    }

    pub fn style_removed(&self, name: &str, container: &ImageContainer) {
        if let Some(hook) = self.styles.get(name) {
            hook.removed(container);
        }
    }
}

/// Deletes the selected image, exactly what Backspace does.
struct RemoveAction;

impl PointAction for RemoveAction {
    fn label(&self) -> &str {
        "Remove"
    }
    fn clicked(&self, _item: &ImageItem) -> Option<Action> {
        Some(Action::DeleteImage)
    }
}
