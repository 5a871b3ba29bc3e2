pub mod api;
pub mod cadence;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod store;
pub mod upload;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use api::HttpTrackingApi;
use cadence::CadenceSettings;
use capture::ScreenCommandCapture;
use config::AppConfig;
use session::{Collaborators, SessionCore};
use store::StateStore;
use upload::ImageHostUploader;
use utils::SystemIdentity;

/// Everything the command surface needs, built once at startup.
pub struct AppState {
    pub core: SessionCore,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(StateStore::open(config.state_path())?);
        let api = HttpTrackingApi::new(config.api_url.clone())
            .context("Failed to build the tracking API client")?;
        let capture = ScreenCommandCapture::from_config(&config.capture, config.screenshots_dir());
        let uploader = ImageHostUploader::from_config(&config.upload);

        let core = SessionCore::new(
            Collaborators {
                api: Arc::new(api),
                capture: Arc::new(capture),
                uploader: Arc::new(uploader),
                identity: Arc::new(SystemIdentity),
            },
            store,
            CadenceSettings::from_config(&config),
        );

        Ok(Self { core, config })
    }
}

/// Entry point for the binary. Returns whether the command succeeded.
pub fn run() -> anyhow::Result<bool> {
    // Initialize logging (reads RUST_LOG env var)
    let default_level = if std::env::var_os("TRACKTIME_DEBUG").is_some_and(|v| v == "1") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    let cli = cli::Cli::parse();
    let config = AppConfig::load()?;
    log::debug!("Config loaded, data dir {}", config.data_dir.display());

    // One thread is plenty: every task here is I/O bound, and capture runs
    // on the blocking pool.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let state = AppState::new(config)?;
        cli::dispatch(cli.command, &state).await
    })
}
