use crate::settings::Settings;
use crate::signs::tables::{DEFAULT_MAPPINGS_JSON, DEFAULT_SIGNS_JSON, DEFAULT_TECHNIQUES_JSON};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Created,
    Kept,
    Overwritten,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Kept => "kept",
            FileStatus::Overwritten => "overwritten",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledFile {
    pub label: &'static str,
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Write `contents` to `path` unless it already exists and `force` is off.
pub fn ensure_file(path: &Path, contents: &str, force: bool) -> anyhow::Result<FileStatus> {
    let existed = path.exists();
    if existed && !force {
        return Ok(FileStatus::Kept);
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(if existed {
        FileStatus::Overwritten
    } else {
        FileStatus::Created
    })
}

/// Install the settings file and the built-in tables next to it.
///
/// An existing settings file is read so the tables land where it points.
pub fn install_defaults(settings_path: &Path, force: bool) -> anyhow::Result<Vec<InstalledFile>> {
    let settings = if settings_path.exists() && !force {
        Settings::load(settings_path)?
    } else {
        Settings::default()
    };
    let settings_json = serde_json::to_string_pretty(&settings)?;
    let paths = settings.table_paths(settings_path);

    let files = [
        ("settings", settings_path.to_path_buf(), settings_json.as_str()),
        ("signs", paths.signs, DEFAULT_SIGNS_JSON),
        ("techniques", paths.techniques, DEFAULT_TECHNIQUES_JSON),
        ("mappings", paths.mappings, DEFAULT_MAPPINGS_JSON),
    ];

    let mut installed = Vec::with_capacity(files.len());
    for (label, path, contents) in files {
        let status = ensure_file(&path, contents, force)?;
        tracing::debug!(label, path = %path.display(), status = status.as_str(), "config file");
        installed.push(InstalledFile {
            label,
            path,
            status,
        });
    }
    Ok(installed)
}
