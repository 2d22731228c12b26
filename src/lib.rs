pub mod app;
pub mod components;
pub mod config;
pub mod document;
pub mod embeds;
pub mod hooks;
pub mod html;
pub mod images;
pub mod remote;
pub mod tui;
pub mod types;
pub mod utils;
pub mod widgets;
