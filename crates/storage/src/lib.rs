//! Project persistence: versioned JSON records with one explicit
//! encode/decode pair per entity. Path-like fields are stored with forward
//! slashes regardless of host OS so project files travel between platforms.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use shared::domain::{
    Hotspot, HotspotId, Project, ProjectId, ScoreSheet, SheetId, SlideIndex, VerseIndex,
};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported schema version {found}, expected {SCHEMA_VERSION}")]
    UnsupportedSchema { found: u32 },
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub id: Uuid,
    pub x: i32,
    pub y: i32,
    pub order: usize,
    pub label: String,
    #[serde(default)]
    pub slide_mappings: BTreeMap<u8, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides_path: Option<String>,
    pub hotspots: Vec<HotspotRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub schema_version: u32,
    pub id: Uuid,
    pub name: String,
    pub current_sheet_index: usize,
    pub current_verse_index: u8,
    pub score_sheets: Vec<SheetRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

fn canonical_path(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn encode_hotspot(hotspot: &Hotspot) -> HotspotRecord {
    HotspotRecord {
        id: hotspot.id.0,
        x: hotspot.x,
        y: hotspot.y,
        order: hotspot.order,
        label: hotspot.label.clone(),
        slide_mappings: hotspot
            .mappings()
            .map(|(verse, slide)| (verse.get(), slide.0))
            .collect(),
    }
}

pub fn decode_hotspot(record: HotspotRecord) -> Result<Hotspot, StorageError> {
    let mut slide_mappings = BTreeMap::new();
    for (raw_verse, slide) in record.slide_mappings {
        let verse = VerseIndex::new(raw_verse).ok_or_else(|| {
            StorageError::InvalidRecord(format!(
                "hotspot {}: verse index {raw_verse} out of range",
                record.id
            ))
        })?;
        slide_mappings.insert(verse, SlideIndex(slide));
    }
    Ok(Hotspot::from_parts(
        HotspotId(record.id),
        record.x,
        record.y,
        record.order,
        record.label,
        slide_mappings,
    ))
}

pub fn encode_sheet(sheet: &ScoreSheet) -> SheetRecord {
    SheetRecord {
        id: sheet.id.0,
        name: sheet.name.clone(),
        image_path: sheet.image_path.as_deref().map(canonical_path),
        slides_path: sheet.slides_path.as_deref().map(canonical_path),
        hotspots: sheet
            .ordered_hotspots()
            .into_iter()
            .map(encode_hotspot)
            .collect(),
    }
}

pub fn decode_sheet(record: SheetRecord) -> Result<ScoreSheet, StorageError> {
    let sheet_id = record.id;
    let mut hotspots = Vec::with_capacity(record.hotspots.len());
    for hotspot_record in record.hotspots {
        hotspots.push(decode_hotspot(hotspot_record)?);
    }

    let mut orders: Vec<usize> = hotspots.iter().map(|h| h.order).collect();
    orders.sort_unstable();
    if orders.iter().enumerate().any(|(i, order)| i != *order) {
        return Err(StorageError::InvalidRecord(format!(
            "sheet {sheet_id}: hotspot display orders are not compact"
        )));
    }
    let mut ids: Vec<Uuid> = hotspots.iter().map(|h| h.id.0).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != hotspots.len() {
        return Err(StorageError::InvalidRecord(format!(
            "sheet {sheet_id}: duplicate hotspot ids"
        )));
    }

    Ok(ScoreSheet::from_parts(
        SheetId(record.id),
        record.name,
        record.image_path.as_deref().map(canonical_path),
        record.slides_path.as_deref().map(canonical_path),
        hotspots,
    ))
}

pub fn encode_project(project: &Project) -> ProjectRecord {
    ProjectRecord {
        schema_version: SCHEMA_VERSION,
        id: project.id.0,
        name: project.name.clone(),
        current_sheet_index: project.current_sheet_index(),
        current_verse_index: project.current_verse().get(),
        score_sheets: project.sheets().iter().map(encode_sheet).collect(),
        saved_at: Some(Utc::now()),
    }
}

pub fn decode_project(record: ProjectRecord) -> Result<Project, StorageError> {
    if record.schema_version != SCHEMA_VERSION {
        return Err(StorageError::UnsupportedSchema {
            found: record.schema_version,
        });
    }
    let verse = VerseIndex::new(record.current_verse_index).ok_or_else(|| {
        StorageError::InvalidRecord(format!(
            "project {}: current verse index {} out of range",
            record.id, record.current_verse_index
        ))
    })?;
    let mut sheets = Vec::with_capacity(record.score_sheets.len());
    for sheet_record in record.score_sheets {
        sheets.push(decode_sheet(sheet_record)?);
    }
    Ok(Project::from_parts(
        ProjectId(record.id),
        record.name,
        sheets,
        record.current_sheet_index,
        verse,
    ))
}

/// Saves and loads project files under a base directory.
pub struct ProjectRepository {
    base_dir: PathBuf,
}

impl ProjectRepository {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes `project` to `file_path`, or to `<base_dir>/<id>.json` when no
    /// explicit path is given. Parent directories are created as needed.
    pub fn save(
        &self,
        project: &Project,
        file_path: Option<&Path>,
    ) -> Result<PathBuf, StorageError> {
        let path = match file_path {
            Some(explicit) => explicit.to_path_buf(),
            None => self.base_dir.join(format!("{}.json", project.id)),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let record = encode_project(project);
        let json = serde_json::to_string_pretty(&record)?;
        fs::write(&path, json).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), sheets = project.sheets().len(), "project saved");
        Ok(path)
    }

    pub fn load(&self, file_path: &Path) -> Result<Project, StorageError> {
        let json = fs::read_to_string(file_path).map_err(|source| StorageError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        let record: ProjectRecord = serde_json::from_str(&json)?;
        let project = decode_project(record)?;
        debug!(path = %file_path.display(), "project loaded");
        Ok(project)
    }

    /// Project files in the base directory, sorted by name.
    pub fn list_projects(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.base_dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        paths
    }

    /// Removes a project file. `Ok(false)` when it did not exist.
    pub fn delete(&self, file_path: &Path) -> Result<bool, StorageError> {
        if !file_path.exists() {
            return Ok(false);
        }
        fs::remove_file(file_path).map_err(|source| StorageError::Io {
            path: file_path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
