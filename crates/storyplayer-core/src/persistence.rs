use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::model::{Composition, Project};

pub fn parse_project(bytes: &[u8]) -> Result<Project> {
    serde_json::from_slice(bytes).context("invalid project json")
}

#[instrument(fields(path = %path.display()))]
pub fn load_project(path: &Path) -> Result<Project> {
    let content =
        fs::read(path).with_context(|| format!("failed to read project: {}", path.display()))?;
    let project = parse_project(&content)?;
    info!(
        compositions = project.compositions.len(),
        elements = project.elements.len(),
        "project loaded"
    );
    Ok(project)
}

#[instrument(skip(project), fields(path = %path.display()))]
pub fn save_project(path: &Path, project: &Project) -> Result<()> {
    write_json_atomic(path, project).context("failed to save project")?;
    info!("project saved");
    Ok(())
}

/// Writes a built composition, derived timing fields included.
#[instrument(skip(composition), fields(path = %path.display(), units = composition.units.len()))]
pub fn save_timeline_snapshot(path: &Path, composition: &Composition) -> Result<()> {
    write_json_atomic(path, composition).context("failed to save timeline snapshot")?;
    info!(total_length = composition.total_length, "timeline snapshot saved");
    Ok(())
}

pub fn load_timeline_snapshot(path: &Path) -> Result<Composition> {
    let content = fs::read(path)
        .with_context(|| format!("failed to read timeline snapshot: {}", path.display()))?;
    serde_json::from_slice(&content).context("invalid timeline snapshot json")
}

fn write_json_atomic(path: &Path, value: &impl Serialize) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(value).context("failed to serialize json")?;
    let mut temp_file = tempfile::NamedTempFile::new_in(
        path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    )
    .context("failed to create temp file")?;

    temp_file
        .write_all(&json)
        .context("failed to write temp file")?;
    temp_file
        .persist(path)
        .map_err(|error| anyhow::anyhow!(error.error))
        .with_context(|| format!("failed to persist file: {}", path.display()))?;
    Ok(())
}
