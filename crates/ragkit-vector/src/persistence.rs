//! Persistence layer for ragkit-vector.
//!
//! Layout under the data path:
//!
//! - `collections.json`: the list of collection names
//! - `{name}/manifest.json`: schema, next id, index parameters, timestamp
//! - `{name}/documents.json`: visible documents in insertion order
//!
//! Every file is written to a `.tmp` sibling and renamed into place, so a
//! crash mid-write leaves the previous version intact.

use crate::collection::{Collection, Segment};
use crate::config::IndexParams;
use crate::error::{Error, Result};
use crate::types::{CollectionSchema, StoredDocument};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const CATALOG_FILE: &str = "collections.json";
const MANIFEST_FILE: &str = "manifest.json";
const DOCUMENTS_FILE: &str = "documents.json";

/// Collection manifest stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionManifest {
    /// Fixed schema.
    pub schema: CollectionSchema,
    /// Next id to assign; ids are never reused across restarts.
    pub next_id: u64,
    /// Index parameters, rebuilt on load when present.
    pub index: Option<IndexParams>,
    /// When the collection was last written.
    pub updated_at: DateTime<Utc>,
}

fn collection_dir(base_path: &Path, name: &str) -> PathBuf {
    base_path.join(name)
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Write the list of collection names.
pub async fn save_catalog(base_path: &Path, names: &[String]) -> Result<()> {
    tokio::fs::create_dir_all(base_path).await?;
    let data = serde_json::to_vec_pretty(names)
        .map_err(|e| Error::Persistence(format!("Failed to serialize collections: {}", e)))?;
    write_atomic(&base_path.join(CATALOG_FILE), &data).await
}

/// Read the list of collection names. A missing catalog is an empty store.
pub async fn load_catalog(base_path: &Path) -> Result<Vec<String>> {
    let path = base_path.join(CATALOG_FILE);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(Vec::new());
    }

    let data = tokio::fs::read_to_string(&path).await?;
    serde_json::from_str(&data)
        .map_err(|e| Error::Persistence(format!("Failed to parse {}: {}", CATALOG_FILE, e)))
}

/// Save a collection's visible state to disk.
pub async fn save_collection(base_path: &Path, collection: &Collection) -> Result<()> {
    let segment = collection.snapshot();
    save_segment(base_path, collection, &segment).await
}

/// Save `segment` as the on-disk state of `collection`.
///
/// Used for writes that are not visible yet: the caller publishes the segment
/// only once this returns `Ok`.
pub async fn save_segment(base_path: &Path, collection: &Collection, segment: &Segment) -> Result<()> {
    let dir = collection_dir(base_path, collection.name());
    tokio::fs::create_dir_all(&dir).await?;

    let manifest = CollectionManifest {
        schema: collection.schema().clone(),
        next_id: collection.next_id(),
        index: segment.index().map(|idx| idx.params()),
        updated_at: Utc::now(),
    };

    let documents = serde_json::to_vec(segment.documents())
        .map_err(|e| Error::Persistence(format!("Failed to serialize documents: {}", e)))?;
    let manifest_json = serde_json::to_vec_pretty(&manifest)
        .map_err(|e| Error::Persistence(format!("Failed to serialize manifest: {}", e)))?;

    // Documents first: a manifest never points past the data it describes.
    write_atomic(&dir.join(DOCUMENTS_FILE), &documents).await?;
    write_atomic(&dir.join(MANIFEST_FILE), &manifest_json).await?;

    debug!(
        name = collection.name(),
        count = segment.documents().len(),
        path = ?dir,
        "Saved collection"
    );
    Ok(())
}

/// Load a collection from disk, rebuilding its index if one was recorded.
pub async fn load_collection(base_path: &Path, name: &str, require_load: bool) -> Result<Collection> {
    let dir = collection_dir(base_path, name);
    let manifest_path = dir.join(MANIFEST_FILE);

    if !tokio::fs::try_exists(&manifest_path).await? {
        return Err(Error::CollectionNotFound(name.to_string()));
    }

    let manifest_json = tokio::fs::read_to_string(&manifest_path).await?;
    let manifest: CollectionManifest = serde_json::from_str(&manifest_json)
        .map_err(|e| Error::Persistence(format!("Failed to parse manifest: {}", e)))?;

    if manifest.schema.name != name {
        return Err(Error::Persistence(format!(
            "manifest in '{}' describes collection '{}'",
            name, manifest.schema.name
        )));
    }

    let documents_path = dir.join(DOCUMENTS_FILE);
    let documents: Vec<StoredDocument> = if tokio::fs::try_exists(&documents_path).await? {
        let data = tokio::fs::read_to_string(&documents_path).await?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Persistence(format!("Failed to parse documents: {}", e)))?
    } else {
        Vec::new()
    };

    let count = documents.len();
    let dimensions = manifest.schema.dimensions;
    let collection = Collection::restore(
        manifest.schema,
        documents,
        manifest.next_id,
        manifest.index,
        require_load,
    )?;

    info!(name, dimensions, count, "Loaded collection");
    Ok(collection)
}

/// Remove a collection's directory.
pub async fn remove_collection(base_path: &Path, name: &str) -> Result<()> {
    let dir = collection_dir(base_path, name);
    if tokio::fs::try_exists(&dir).await? {
        tokio::fs::remove_dir_all(&dir).await?;
    }
    Ok(())
}
