use std::{fmt::Write as _, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::model::{Composition, Project};

const REPORT_SCHEMA_VERSION: u32 = 1;

/// Summary of a built composition with a fingerprint of its derived timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineReport {
    pub schema_version: u32,
    pub project_title: Option<String>,
    pub composition_index: usize,
    pub composition_name: Option<String>,
    pub unit_count: usize,
    pub empty_unit_count: usize,
    pub event_count: usize,
    pub element_count: usize,
    pub total_length: f64,
    pub timeline_hash: String,
}

#[instrument(skip(project, composition))]
#[must_use]
pub fn generate_timeline_report(
    project: &Project,
    composition_index: usize,
    composition: &Composition,
) -> TimelineReport {
    TimelineReport {
        schema_version: REPORT_SCHEMA_VERSION,
        project_title: project.title.clone(),
        composition_index,
        composition_name: composition.name.clone(),
        unit_count: composition.units.len(),
        empty_unit_count: composition
            .units
            .iter()
            .filter(|unit| unit.events.is_empty())
            .count(),
        event_count: composition.event_count(),
        element_count: project.elements.len(),
        total_length: composition.total_length,
        timeline_hash: timeline_hash(composition),
    }
}

/// SHA-256 over the unit and event layout, rounded to microseconds.
#[must_use]
pub fn timeline_hash(composition: &Composition) -> String {
    let mut canonical = String::new();
    for unit in &composition.units {
        let _ = writeln!(
            canonical,
            "unit|{}|{:.6}|{:.6}",
            unit.label, unit.start_time, unit.length
        );
        for event in &unit.events {
            let _ = writeln!(
                canonical,
                "event|{}|{}|{:.6}|{:.6}",
                event.element_id, event.element_type, event.computed_start, event.computed_duration
            );
        }
    }
    let _ = write!(canonical, "total|{:.6}", composition.total_length);

    let digest = Sha256::digest(canonical.as_bytes());
    format!("{digest:x}")
}

pub fn read_timeline_report(path: &Path) -> Result<TimelineReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read timeline report: {}", path.display()))?;
    serde_json::from_slice(&bytes).context("failed to parse timeline report json")
}

pub fn write_timeline_report(path: &Path, report: &TimelineReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(report).context("failed to encode timeline report json")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write timeline report: {}", path.display()))?;
    Ok(())
}
