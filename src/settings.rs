//! Settings infrastructure for semstore.
//!
//! Settings live in the `[semantic_tokens]` table of a `settings.toml` file,
//! discovered from the workspace root the same way the rest of the editor
//! finds its settings.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default capacity of a session's update queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// Root settings structure loaded from settings.toml.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Semantic token configuration.
    pub semantic_tokens: Option<SemanticTokenSettings>,
}

impl Settings {
    /// Effective semantic token settings, with defaults for anything unset.
    pub fn semantic_tokens(&self) -> SemanticTokenSettings {
        self.semantic_tokens.clone().unwrap_or_default()
    }
}

/// Settings for a document's token session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SemanticTokenSettings {
    /// Sort and de-duplicate invalidated ranges before publishing them.
    pub merge_invalidations: bool,

    /// Number of pending server responses a session buffers.
    pub queue_capacity: usize,
}

impl Default for SemanticTokenSettings {
    fn default() -> Self {
        Self {
            merge_invalidations: true,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SemanticTokenSettings {
    /// Queue capacity clamped to what a channel accepts.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

/// Load settings from a settings.toml file.
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(path: &Path) -> Settings {
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse settings.toml");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

/// File name looked up during discovery.
const SETTINGS_FILE: &str = "settings.toml";

/// Find the settings that apply to `start_dir`.
///
/// `start_dir` and each of its ancestors are tried first, nearest wins. When
/// none of them has a settings file, the immediate subdirectories of
/// `start_dir` are tried in name order, so a workspace opened one level above
/// its project still picks up the project's settings.
///
/// Returns the settings and the directory they were read from, or defaults
/// and `start_dir` when nothing was found.
pub fn discover_settings(start_dir: &Path) -> (Settings, PathBuf) {
    let found = start_dir
        .ancestors()
        .find(|dir| dir.join(SETTINGS_FILE).is_file())
        .map(Path::to_path_buf)
        .or_else(|| first_child_with_settings(start_dir));

    match found {
        Some(dir) => {
            let path = dir.join(SETTINGS_FILE);
            tracing::debug!(path = %path.display(), "found settings");
            (load_settings(&path), dir)
        }
        None => (Settings::default(), start_dir.to_path_buf()),
    }
}

fn first_child_with_settings(dir: &Path) -> Option<PathBuf> {
    let mut children: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    children.sort();
    children
        .into_iter()
        .find(|child| child.join(SETTINGS_FILE).is_file())
}
