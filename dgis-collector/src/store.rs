//! Persistence of merged route records.
//!
//! Each collected route produces two sibling artifacts under
//! `routes/<city>/`: the full API document enriched with `additional_info`
//! (`<name>.json`) and the derived geometry feature collection
//! (`<name>.geojson`). Records are immutable once written; a later route
//! deriving the same file name simply overwrites the earlier pair.

use crate::correlator::{ScheduleFragment, additional_info};
use dgis_api::RouteItem;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write route artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize route artifact: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct RecordStore {
    city_dir: PathBuf,
}

impl RecordStore {
    /// Creates a store rooted at `<base>/routes/<city>`.
    ///
    /// The caller is expected to pass an already normalized city name
    /// (lower-cased, trimmed); see `SessionOptions`.
    pub fn new(base: impl AsRef<Path>, city: &str) -> Self {
        RecordStore {
            city_dir: base.as_ref().join("routes").join(city),
        }
    }

    /// Derives the filesystem-safe file stem for a route.
    pub fn file_stem_for(route: &RouteItem) -> String {
        sanitize_file_stem(route.name.as_deref().unwrap_or("unknown"))
    }

    /// Writes the enriched JSON document and its GeoJSON sibling.
    ///
    /// Returns the JSON artifact's file name. Directory creation is
    /// idempotent, and name collisions overwrite (last-write-wins).
    ///
    /// # Errors
    ///
    /// Fails on filesystem errors or if either artifact cannot be
    /// serialized.
    pub async fn persist(
        &self,
        route: &RouteItem,
        mut document: JsonValue,
        fragment: Option<ScheduleFragment>,
    ) -> Result<String, StoreError> {
        fs::create_dir_all(&self.city_dir).await?;

        let info = additional_info(route, fragment.as_ref());
        if let Some(map) = document.as_object_mut() {
            map.insert("additional_info".to_string(), info);
        }

        let stem = Self::file_stem_for(route);
        let file_name = format!("{stem}.json");
        fs::write(
            self.city_dir.join(&file_name),
            serde_json::to_vec_pretty(&document)?,
        )
        .await?;

        let collection = dgis_geometry::route_feature_collection(route);
        fs::write(
            self.city_dir.join(format!("{stem}.geojson")),
            serde_json::to_vec_pretty(&collection)?,
        )
        .await?;

        Ok(file_name)
    }
}

/// Replaces characters that are unsafe in file names.
///
/// The route display name is typically a short line number, but nothing
/// stops the site from serving names with separators in them.
fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}
