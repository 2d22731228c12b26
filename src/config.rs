use crate::types::Action as AppAction;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub dev: bool,
}

impl Config {
    pub fn set_default_keybindings(&mut self) {
        let global = [
            (
                Key(KeyCode::Char('q'), Some(KeyModifiers::CONTROL)),
                GlobalAction::Quit,
            ),
            (
                Key(KeyCode::Char('s'), Some(KeyModifiers::CONTROL)),
                GlobalAction::Save,
            ),
        ];
        for (key, action) in global {
            self.keybindings.global.entry(key).or_insert(action);
        }
        let editor = [
            (
                Key(KeyCode::Char('e'), Some(KeyModifiers::CONTROL)),
                EditorAction::InsertEmbed,
            ),
            (
                Key(KeyCode::Char('g'), Some(KeyModifiers::CONTROL)),
                EditorAction::InsertImages,
            ),
            (
                Key(KeyCode::Char('n'), Some(KeyModifiers::CONTROL)),
                EditorAction::NextBlock,
            ),
            (
                Key(KeyCode::Char('p'), Some(KeyModifiers::CONTROL)),
                EditorAction::PrevBlock,
            ),
        ];
        for (key, action) in editor {
            self.keybindings.editor.entry(key).or_insert(action);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Keybindings {
    #[serde(default)]
    pub global: HashMap<Key, GlobalAction>,
    #[serde(default)]
    pub editor: HashMap<Key, EditorAction>,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Key(pub KeyCode, pub Option<KeyModifiers>);

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        Self(
            event.code,
            match event.modifiers {
                KeyModifiers::CONTROL | KeyModifiers::SHIFT => Some(event.modifiers),
                _ => None,
            },
        )
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            KeyCode::Char(c) => match self.1 {
                Some(modifier) => {
                    let modifier = match modifier {
                        KeyModifiers::CONTROL => "Ctrl",
                        KeyModifiers::SHIFT => "Shift",
                        _ => return Err(serde::ser::Error::custom("invalid key modifier")),
                    };
                    format!("{modifier}-{c}").serialize(serializer)
                }
                None => c.to_string().serialize(serializer),
            },
            _ => Err(serde::ser::Error::custom("invalid key code")),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if let Some((modifier, code)) = s.split_once('-') {
            let mut chars = code.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                Ok(Self(
                    KeyCode::Char(c),
                    match modifier {
                        "Ctrl" => Some(KeyModifiers::CONTROL),
                        "Shift" => Some(KeyModifiers::SHIFT),
                        _ => return Err(serde::de::Error::custom("invalid key modifier")),
                    },
                ))
            } else {
                Err(serde::de::Error::custom("invalid key"))
            }
        } else {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                Ok(Self(KeyCode::Char(c), None))
            } else {
                Err(serde::de::Error::custom("invalid key"))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
    Save,
}

impl From<&GlobalAction> for AppAction {
    fn from(action: &GlobalAction) -> Self {
        match action {
            GlobalAction::Quit => AppAction::Quit,
            GlobalAction::Save => AppAction::Save,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EditorAction {
    NextBlock,
    PrevBlock,
    InsertEmbed,
    InsertImages,
    Enter,
    Back,
}

impl From<&EditorAction> for AppAction {
    fn from(action: &EditorAction) -> Self {
        match action {
            EditorAction::NextBlock => AppAction::NextBlock,
            EditorAction::PrevBlock => AppAction::PrevBlock,
            EditorAction::InsertEmbed => AppAction::InsertEmbed,
            EditorAction::InsertImages => AppAction::InsertImages,
            EditorAction::Enter => AppAction::Enter,
            EditorAction::Back => AppAction::Back,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Prompt shown inside an empty embed slot.
    pub placeholder: String,
    /// Metadata lookup endpoint; unset falls back to local pattern matching.
    pub oembed_proxy: Option<String>,
    pub preview: bool,
    pub captions: bool,
    pub caption_placeholder: String,
    /// Item count at which a container switches to the grid style; 0 disables.
    pub auto_grid: usize,
    pub default_style: String,
    pub styles: IndexMap<String, StyleConfig>,
    pub upload: UploadConfig,
    pub delete: DeleteConfig,
    pub messages: Messages,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder:
                "Paste a YouTube, Vimeo, Facebook, Twitter or Instagram link and press Enter"
                    .into(),
            oembed_proxy: None,
            preview: true,
            captions: true,
            caption_placeholder: "Type caption for image (optional)".into(),
            auto_grid: 3,
            default_style: "wide".into(),
            styles: IndexMap::from_iter([
                (
                    "wide".into(),
                    StyleConfig {
                        label: "Wide".into(),
                    },
                ),
                (
                    "left".into(),
                    StyleConfig {
                        label: "Left".into(),
                    },
                ),
                (
                    "right".into(),
                    StyleConfig {
                        label: "Right".into(),
                    },
                ),
                (
                    "full-width".into(),
                    StyleConfig {
                        label: "Full width".into(),
                    },
                ),
                (
                    "grid".into(),
                    StyleConfig {
                        label: "Grid".into(),
                    },
                ),
            ]),
            upload: UploadConfig::default(),
            delete: DeleteConfig::default(),
            messages: Messages::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StyleConfig {
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    pub url: String,
    pub accept_file_types: String,
    pub max_file_size: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/upload".into(),
            accept_file_types: r"(?i)(\.|/)(gif|jpe?g|png)$".into(),
            max_file_size: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DeleteConfig {
    /// Unset disables the remote delete call.
    pub url: Option<String>,
    pub method: String,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            url: None,
            method: "POST".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Messages {
    pub accept_file_types_error: String,
    pub max_file_size_error: String,
    pub resolve_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            accept_file_types_error: "This file is not in a supported format: ".into(),
            max_file_size_error: "This file is too big: ".into(),
            resolve_error: "Incorrect URL format specified".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let config = toml::from_str::<Config>("").expect("failed to deserialize config");
        assert_eq!(config, Config::default());
        assert_eq!(config.editor.auto_grid, 3);
        assert_eq!(config.editor.default_style, "wide");
        assert!(config.editor.preview);
    }

    #[test]
    fn deserialize() {
        let input = r#"
[keybindings.global]
Ctrl-c = "Quit"

[keybindings.editor]
Ctrl-n = "NextBlock"

[editor]
preview = false
auto_grid = 5

[editor.upload]
url = "https://media.example.com/upload"
max_file_size = 1000000
"#;
        let config = toml::from_str::<Config>(input).expect("failed to deserialize config");
        assert_eq!(
            config.keybindings.global,
            HashMap::from_iter([(
                Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL)),
                GlobalAction::Quit
            )])
        );
        assert_eq!(
            config.keybindings.editor,
            HashMap::from_iter([(
                Key(KeyCode::Char('n'), Some(KeyModifiers::CONTROL)),
                EditorAction::NextBlock
            )])
        );
        assert!(!config.editor.preview);
        assert_eq!(config.editor.auto_grid, 5);
        assert_eq!(config.editor.upload.url, "https://media.example.com/upload");
        assert_eq!(config.editor.upload.max_file_size, Some(1_000_000));
        // untouched fields keep their defaults
        assert!(config.editor.captions);
        assert_eq!(config.editor.styles.len(), 5);
    }

    #[test]
    fn serialize() {
        let mut config = Config {
            keybindings: Keybindings {
                global: HashMap::from_iter([
                    (
                        Key(KeyCode::Char('q'), Some(KeyModifiers::CONTROL)),
                        GlobalAction::Quit,
                    ),
                    (Key(KeyCode::Char('?'), None), GlobalAction::Save),
                ]),
                editor: HashMap::new(),
            },
            editor: EditorConfig::default(),
            dev: true,
        };
        config.editor.oembed_proxy = Some("https://iframe.ly/api/oembed".into());
        let s = toml::to_string(&config).expect("failed to serialize config");
        let deserialized = toml::from_str::<Config>(&s).expect("failed to deserialize config");
        assert_eq!(deserialized, config);
    }

    #[test]
    fn default_keybindings_do_not_override() {
        let mut config = Config::default();
        config.keybindings.global.insert(
            Key(KeyCode::Char('s'), Some(KeyModifiers::CONTROL)),
            GlobalAction::Quit,
        );
        config.set_default_keybindings();
        assert_eq!(
            config.keybindings.global[&Key(KeyCode::Char('s'), Some(KeyModifiers::CONTROL))],
            GlobalAction::Quit
        );
        assert_eq!(
            config.keybindings.editor[&Key(KeyCode::Char('e'), Some(KeyModifiers::CONTROL))],
            EditorAction::InsertEmbed
        );
    }
}
