//! JSON catalog manifest loading
//!
//! A manifest lists songs (metadata plus storage paths of each encoding) and
//! requester accounts with their format preference. Loading it produces the
//! in-memory catalog and account stores the server runs against.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::{Asset, InMemoryCatalog, SongMetadata, VariantSet};
use crate::accounts::{FormatPreference, InMemoryAccountStore};

/// Errors raised while loading a catalog manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Manifest file could not be read
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        /// Path of the manifest file
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Manifest content is not valid manifest JSON
    #[error("Invalid manifest: {source}")]
    Parse {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// The same identifier appears twice
    #[error("Duplicate {kind} id in manifest: {id}")]
    DuplicateId {
        /// Either "song" or "user"
        kind: &'static str,
        /// The repeated identifier
        id: String,
    },
}

/// One song record of the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct SongEntry {
    pub id: String,
    #[serde(flatten)]
    pub metadata: SongMetadata,
    /// Lossless encoding, relative to the media root
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// Lossy encoding, relative to the media root
    #[serde(default)]
    pub file_path_lossy: Option<PathBuf>,
}

/// One requester account of the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    pub preference: FormatPreference,
}

/// Parsed catalog manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub songs: Vec<SongEntry>,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

impl CatalogManifest {
    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    /// - `ManifestError::Io` - File could not be read
    /// - `ManifestError::Parse` - Content is not a valid manifest
    pub async fn load(path: &Path) -> Result<Self, ManifestError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let manifest = Self::from_json(&json)?;
        info!(
            "Loaded manifest {}: {} songs, {} users",
            path.display(),
            manifest.songs.len(),
            manifest.users.len()
        );
        Ok(manifest)
    }

    /// Parses a manifest from a JSON string.
    ///
    /// # Errors
    /// - `ManifestError::Parse` - Content is not a valid manifest
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds the catalog and account stores described by this manifest.
    ///
    /// # Errors
    /// - `ManifestError::DuplicateId` - A song or user id is listed twice
    pub fn into_stores(self) -> Result<(InMemoryCatalog, InMemoryAccountStore), ManifestError> {
        let catalog = InMemoryCatalog::new();
        let mut seen = HashSet::new();
        for song in self.songs {
            if !seen.insert(song.id.clone()) {
                return Err(ManifestError::DuplicateId {
                    kind: "song",
                    id: song.id,
                });
            }
            if song.file_path.is_none() && song.file_path_lossy.is_none() {
                debug!("Song {} has no stored encodings", song.id);
            }
            catalog.insert(Asset {
                id: song.id,
                metadata: song.metadata,
                variants: VariantSet::from_paths(song.file_path, song.file_path_lossy),
            });
        }

        let accounts = InMemoryAccountStore::new();
        let mut seen = HashSet::new();
        for user in self.users {
            if !seen.insert(user.id.clone()) {
                return Err(ManifestError::DuplicateId {
                    kind: "user",
                    id: user.id,
                });
            }
            accounts.insert(user.id, user.preference);
        }

        Ok((catalog, accounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountStore;
    use crate::catalog::{CatalogStore, EncodingTier};

    const MANIFEST: &str = r#"{
        "songs": [
            {
                "id": "s1",
                "title": "First Light",
                "duration": 215,
                "artist": "a1",
                "featured_artist": ["a2"],
                "genre": "ambient",
                "liked_by": ["u1", "u2"],
                "file_path": "flac/s1.flac",
                "file_path_lossy": "opus/s1.opus"
            },
            { "id": "s2", "title": "Demo", "duration": 30, "artist": "a1" }
        ],
        "users": [
            { "id": "u1", "preference": "flac" },
            { "id": "u2", "preference": "lossy" }
        ]
    }"#;

    #[tokio::test]
    async fn test_manifest_builds_stores() {
        let manifest = CatalogManifest::from_json(MANIFEST).unwrap();
        let (catalog, accounts) = manifest.into_stores().unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(accounts.len(), 2);

        let song = catalog.asset("s1").await.unwrap();
        assert_eq!(song.metadata.title, "First Light");
        assert_eq!(song.metadata.liked_by.len(), 2);
        assert_eq!(
            song.variants
                .get(EncodingTier::Lossless)
                .map(|v| v.storage_path.clone()),
            Some(PathBuf::from("flac/s1.flac"))
        );

        let bare = catalog.asset("s2").await.unwrap();
        assert!(bare.variants.is_empty());
        assert_eq!(bare.metadata.play_count, 0);

        assert_eq!(
            accounts.preference("u2").await,
            Some(FormatPreference::Lossy)
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{ "users": [
            { "id": "u1", "preference": "flac" },
            { "id": "u1", "preference": "opus" }
        ] }"#;
        let result = CatalogManifest::from_json(json).unwrap().into_stores();
        assert!(matches!(
            result,
            Err(ManifestError::DuplicateId { kind: "user", .. })
        ));
    }

    #[test]
    fn test_unknown_preference_rejected() {
        let json = r#"{ "users": [{ "id": "u1", "preference": "mp3" }] }"#;
        assert!(matches!(
            CatalogManifest::from_json(json),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = CatalogManifest::load(Path::new("/nonexistent/catalog.json")).await;
        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        tokio::fs::write(&path, MANIFEST).await.unwrap();

        let manifest = CatalogManifest::load(&path).await.unwrap();
        assert_eq!(manifest.songs.len(), 2);
    }
}
