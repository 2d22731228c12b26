use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::{env, fs};
use tuidraft::app::App;
use tuidraft::config::Config;
use tuidraft::utils::{get_config_dir, initialize_panic_handler};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// TUI editor for drafting rich-media articles.
struct Args {
    /// Path the document is saved to.
    #[arg(default_value = "draft.html")]
    output: PathBuf,
    /// Path to the configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Development mode
    #[arg(short, long)]
    dev: bool,
}

impl Args {
    fn config_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            Ok(path.clone())
        } else {
            Self::default_config_path()
        }
    }
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = get_config_dir()?;
        fs::create_dir_all(&config_dir)?;
        Ok(config_dir.join("tuidraft.config.toml"))
    }
}

fn init_logger(dev: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if env::var("RUST_LOG").is_err() {
        builder.filter_level(if dev {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Off
        });
    }
    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = if args.config_path()?.exists() {
        toml::from_str(&fs::read_to_string(args.config_path()?)?)?
    } else {
        Config::default()
    };
    config.set_default_keybindings();
    config.dev |= args.dev;

    init_logger(config.dev);

    initialize_panic_handler()?;

    App::new(config, args.output).run().await
}
