use include_dir::{include_dir, Dir};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoadError;

static INTRO_DIR: Dir = include_dir!("assets/intro");

/// Resource loader consumed by the frame sequencer.
pub trait FrameLoader {
    type Frame;

    /// Resolve one identifier into a displayable frame.
    fn resolve(&mut self, id: &str) -> Result<Self::Frame, LoadError>;
}

/// Intro frames compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedFrames;

impl EmbeddedFrames {
    /// Identifiers of the bundled intro, in playback order.
    pub fn intro_ids() -> Vec<String> {
        let mut ids: Vec<String> = INTRO_DIR
            .files()
            .filter_map(|f| f.path().to_str())
            .filter(|p| p.ends_with(".txt"))
            .map(str::to_string)
            .collect();
        ids.sort();
        ids
    }
}

impl FrameLoader for EmbeddedFrames {
    type Frame = String;

    fn resolve(&mut self, id: &str) -> Result<String, LoadError> {
        let file = INTRO_DIR
            .get_file(id)
            .ok_or_else(|| LoadError::new(id, "not bundled"))?;
        file.contents_utf8()
            .map(str::to_string)
            .ok_or_else(|| LoadError::new(id, "not valid utf-8"))
    }
}

/// Text frames read from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirFrameLoader {
    root: PathBuf,
}

impl DirFrameLoader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// `.txt` files in the directory, sorted by name. An unreadable
    /// directory yields no ids, which the sequencer reports as a failed load.
    pub fn frame_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = fs::read_dir(&self.root)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter_map(|e| e.file_name().to_str().map(str::to_string))
                    .filter(|name| name.ends_with(".txt"))
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl FrameLoader for DirFrameLoader {
    type Frame = String;

    fn resolve(&mut self, id: &str) -> Result<String, LoadError> {
        fs::read_to_string(self.root.join(id)).map_err(|e| LoadError::new(id, e.to_string()))
    }
}

/// Where the intro comes from: the bundled frames or a user directory.
#[derive(Debug, Clone)]
pub enum IntroSource {
    Embedded(EmbeddedFrames),
    Dir(DirFrameLoader),
}

impl IntroSource {
    pub fn new(frames_dir: Option<&Path>) -> Self {
        match frames_dir {
            Some(dir) => Self::Dir(DirFrameLoader::new(dir)),
            None => Self::Embedded(EmbeddedFrames),
        }
    }

    pub fn frame_ids(&self) -> Vec<String> {
        match self {
            Self::Embedded(_) => EmbeddedFrames::intro_ids(),
            Self::Dir(loader) => loader.frame_ids(),
        }
    }
}

impl FrameLoader for IntroSource {
    type Frame = String;

    fn resolve(&mut self, id: &str) -> Result<String, LoadError> {
        match self {
            Self::Embedded(loader) => loader.resolve(id),
            Self::Dir(loader) => loader.resolve(id),
        }
    }
}

impl<F: Clone> FrameLoader for HashMap<String, F> {
    type Frame = F;

    fn resolve(&mut self, id: &str) -> Result<F, LoadError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| LoadError::new(id, "unknown frame"))
    }
}
