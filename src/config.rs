//! Client configuration.
//!
//! Sources, highest precedence first:
//! 1. Environment variables (`TRACKTIME_*`)
//! 2. `config.json` in the data directory
//! 3. Defaults

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const CONFIG_FILE: &str = "config.json";
pub const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Root of the tracking API, e.g. `http://localhost:3001/api`.
    pub api_url: String,
    pub screenshot_interval_secs: u64,
    /// Upper bound for a single capture/upload/submit cycle.
    pub cycle_timeout_secs: u64,
    pub upload: UploadConfig,
    pub capture: CaptureConfig,
    #[serde(skip)]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UploadConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Overrides the platform screenshot command. `{path}` is replaced with
    /// the output file.
    pub command: Option<Vec<String>>,
    /// Captures smaller than this are treated as blank frames.
    pub min_bytes: u64,
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3001/api".into(),
            screenshot_interval_secs: 5 * 60,
            cycle_timeout_secs: 120,
            upload: UploadConfig::default(),
            capture: CaptureConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.imgbb.com/1/upload".into(),
            api_key: None,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: None,
            min_bytes: 1000,
            output_dir: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tracktime")
}

impl AppConfig {
    /// Load using the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = env("TRACKTIME_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let mut config = Self::from_file(&data_dir.join(CONFIG_FILE))?;
        config.data_dir = data_dir;
        config.apply_env(env)?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env("TRACKTIME_API_URL") {
            self.api_url = url;
        }
        if let Some(secs) = env("TRACKTIME_SCREENSHOT_INTERVAL_SECS") {
            self.screenshot_interval_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("TRACKTIME_SCREENSHOT_INTERVAL_SECS is not a number: {secs}"))?;
        }
        if let Some(key) = env("TRACKTIME_UPLOAD_KEY") {
            self.upload.api_key = Some(key);
        }

        if self.screenshot_interval_secs == 0 {
            return Err(anyhow!("screenshot interval must be greater than zero"));
        }
        if self.cycle_timeout_secs == 0 {
            return Err(anyhow!("cycle timeout must be greater than zero"));
        }
        while self.api_url.ends_with('/') {
            self.api_url.pop();
        }
        Ok(())
    }

    pub fn screenshot_interval(&self) -> Duration {
        Duration::from_secs(self.screenshot_interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.capture
            .output_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("tracktime-screenshots"))
    }
}
