use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// One image and the narration audio that plays over it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub image_path: PathBuf,
    pub audio_path: PathBuf,
    /// Narration text; informational only.
    #[serde(default)]
    pub narration: String,
}

impl Scene {
    pub fn new(image_path: impl Into<PathBuf>, audio_path: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            audio_path: audio_path.into(),
            narration: String::new(),
        }
    }

    pub fn with_narration(mut self, narration: impl Into<String>) -> Self {
        self.narration = narration.into();
        self
    }
}

/// Read an ordered scene list from a JSON array. Relative paths resolve against the file's
/// directory.
pub fn load_scenes(path: &Path) -> anyhow::Result<Vec<Scene>> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("read scenes {}", path.display()))?;
    let mut scenes: Vec<Scene> =
        serde_json::from_str(&text).with_context(|| format!("parse scenes {}", path.display()))?;
    if let Some(base) = path.parent() {
        for s in &mut scenes {
            if s.image_path.is_relative() {
                s.image_path = base.join(&s.image_path);
            }
            if s.audio_path.is_relative() {
                s.audio_path = base.join(&s.audio_path);
            }
        }
    }
    Ok(scenes)
}

/// Delete the generated narration audio of each scene. Returns how many files were removed.
///
/// Failures are logged and do not stop the remaining deletions.
pub fn cleanup_scene_audio(scenes: &[Scene]) -> usize {
    let mut removed = 0;
    for scene in scenes {
        if !scene.audio_path.exists() {
            continue;
        }
        match std::fs::remove_file(&scene.audio_path) {
            Ok(()) => {
                tracing::info!(path = %scene.audio_path.display(), "removed narration audio");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %scene.audio_path.display(), error = %e, "could not remove narration audio")
            }
        }
    }
    removed
}
