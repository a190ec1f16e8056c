use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::IntroSource;
use crate::session::{SessionConfig, Settings};
use crate::shuffle::DEFAULT_SHUFFLES;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    pub shuffle_budget: u32,
    pub frame_rate: i32,
    pub loop_intro: bool,
    pub volume: f32,
    pub frames_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: 60,
            shuffle_budget: DEFAULT_SHUFFLES,
            frame_rate: 8,
            loop_intro: false,
            volume: 0.5,
            frames_dir: None,
        }
    }
}

impl Config {
    pub fn intro_source(&self) -> IntroSource {
        IntroSource::new(self.frames_dir.as_deref())
    }

    /// Build the session configuration, listing intro frames from `source`.
    pub fn session_config(&self, source: &IntroSource, seed: Option<u64>) -> SessionConfig {
        SessionConfig {
            duration_secs: self.duration_secs,
            shuffle_budget: self.shuffle_budget,
            frame_rate: self.frame_rate,
            loop_intro: self.loop_intro,
            intro_frames: source.frame_ids(),
            seed,
            settings: Settings {
                volume: self.volume.clamp(0.0, 1.0),
            },
            ..SessionConfig::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "divvy") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("divvy_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(error = %e, path = %self.path.display(), "Ignoring unreadable config")
                }
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
