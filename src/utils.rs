use crate::tui;
use color_eyre::config::HookBuilder;
use color_eyre::eyre::OptionExt;
use directories::ProjectDirs;
use std::panic;
use std::path::PathBuf;

pub fn get_config_dir() -> color_eyre::Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "tuidraft", "tuidraft")
        .ok_or_eyre("failed to determine config directory")?;
    Ok(dirs.config_dir().to_path_buf())
}

pub fn initialize_panic_handler() -> color_eyre::Result<()> {
    let (panic_hook, eyre_hook) = HookBuilder::default().into_hooks();
    eyre_hook.install()?;

    let panic_hook = panic_hook.into_panic_hook();
    panic::set_hook(Box::new(move |panic_info| {
        tui::restore().expect("failed to restore terminal");
        panic_hook(panic_info);
    }));
    Ok(())
}
