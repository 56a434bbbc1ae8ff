use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::{config::CatalogConfig, model::Project, persistence};

pub const PROJECT_FILE_SUFFIX: &str = ".project.json";

/// Where project data comes from. Fetching is synchronous; hosts that load in the background
/// pair it with [`crate::PlayerSession::begin_load`] and [`crate::PlayerSession::finish_load`].
pub trait ProjectSource {
    fn fetch(&self, key: &str) -> Result<Project>;
}

/// Project keys mapped to the files that hold them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectCatalog {
    locations: BTreeMap<String, PathBuf>,
}

impl ProjectCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the configured directories, then applies the explicit key table on top.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let mut catalog = Self::new();
        for directory in &config.scan_directories {
            catalog.scan_directory(directory)?;
        }
        for (key, location) in &config.projects {
            catalog.insert(key.clone(), location.clone());
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, key: impl Into<String>, location: impl Into<PathBuf>) {
        self.locations.insert(key.into(), location.into());
    }

    #[must_use]
    pub fn location(&self, key: &str) -> Option<&Path> {
        self.locations.get(key).map(PathBuf::as_path)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Adds every `*.project.json` below `directory`. Returns how many were found.
    pub fn scan_directory(&mut self, directory: &Path) -> Result<usize> {
        let found = discover_project_files(directory)?;
        let count = found.len();
        self.locations.extend(found);
        Ok(count)
    }
}

impl ProjectSource for ProjectCatalog {
    fn fetch(&self, key: &str) -> Result<Project> {
        let path = self
            .location(key)
            .with_context(|| format!("unknown project key: {key}"))?;
        persistence::load_project(path)
    }
}

/// Finds project files below `directory`, keyed by file name without the project suffix.
#[instrument(fields(directory = %directory.display()))]
pub fn discover_project_files(directory: &Path) -> Result<BTreeMap<String, PathBuf>> {
    if !directory.exists() {
        warn!("project directory missing, nothing to scan");
        return Ok(BTreeMap::new());
    }

    if !directory.is_dir() {
        return Err(anyhow::anyhow!(
            "project path is not a directory: {}",
            directory.display()
        ));
    }

    let mut projects = BTreeMap::new();
    for entry in WalkDir::new(directory).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(?error, "ignoring unreadable entry while scanning projects");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(key) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_suffix(PROJECT_FILE_SUFFIX))
            .filter(|key| !key.is_empty())
        else {
            continue;
        };

        projects.insert(key.to_string(), entry.path().to_path_buf());
    }

    debug!(count = projects.len(), "project scan complete");
    Ok(projects)
}
