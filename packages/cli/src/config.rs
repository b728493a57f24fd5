use anyhow::Context;
use scribe_editor::EditorConfig;
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "scribe.config.json";

/// Load the editor config.
///
/// An explicit path must exist. Without one, `scribe.config.json` in `cwd`
/// is used when present, defaults otherwise.
pub fn load(cwd: &Path, explicit: Option<&Path>) -> anyhow::Result<EditorConfig> {
    if let Some(path) = explicit {
        return read(path);
    }

    let default_path = cwd.join(DEFAULT_CONFIG_NAME);
    if default_path.exists() {
        read(&default_path)
    } else {
        Ok(EditorConfig::default())
    }
}

fn read(path: &Path) -> anyhow::Result<EditorConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config {}", path.display()))?;
    EditorConfig::from_json(&content).with_context(|| format!("Invalid config {}", path.display()))
}
