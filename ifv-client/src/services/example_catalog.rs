//! Example asset catalog
//!
//! Fixed set of bundled sample dishes. Each entry is a static image under the
//! configured static assets root, read as plain bytes (no multipart, no retry)
//! before entering the normal submission path.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::preview_decoder::sniff_mime;
use crate::models::ImageSubmission;

/// One bundled example image
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ExampleAsset {
    /// Display name, also the base of the uploaded file name
    pub name: &'static str,
    /// Path relative to the static assets root
    pub path: &'static str,
}

pub const EXAMPLE_ASSETS: [ExampleAsset; 8] = [
    ExampleAsset { name: "Biryani", path: "examples/biryani.jpg" },
    ExampleAsset { name: "Masala Dosa", path: "examples/masala_dosa.jpg" },
    ExampleAsset { name: "Gulab Jamun", path: "examples/gulab_jamun.jpg" },
    ExampleAsset { name: "Pani Puri", path: "examples/pani_puri.jpg" },
    ExampleAsset { name: "Hara Bhara Kabab", path: "examples/hara_bhara_kabab.jpg" },
    ExampleAsset { name: "Falooda", path: "examples/falooda.jpg" },
    ExampleAsset { name: "Chicken Pizza", path: "examples/chicken_pizza.jpg" },
    ExampleAsset { name: "Sandwich", path: "examples/sandwich.jpg" },
];

/// Example catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Unknown example: {0}")]
    UnknownExample(String),

    #[error("Failed to load image {path}: {source}")]
    AssetRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ExampleCatalog {
    root: PathBuf,
}

impl ExampleCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &'static [ExampleAsset] {
        &EXAMPLE_ASSETS
    }

    /// Look up an entry by display name or slug
    ///
    /// Case-insensitive; spaces, `_` and `-` are interchangeable, so
    /// "Masala Dosa", "masala_dosa" and "masala-dosa" all match.
    pub fn find(&self, name: &str) -> Option<&'static ExampleAsset> {
        let wanted = slug(name);
        EXAMPLE_ASSETS.iter().find(|asset| slug(asset.name) == wanted)
    }

    /// Read an example's bytes and wrap them as a submission
    pub async fn resolve(&self, asset: &ExampleAsset) -> Result<ImageSubmission, CatalogError> {
        let path = self.root.join(asset.path);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| CatalogError::AssetRead {
                path: path.clone(),
                source,
            })?;

        let extension = Path::new(asset.path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let mime_type = match infer::get(&bytes) {
            Some(kind) => kind.mime_type(),
            None => mime_from_extension(extension).unwrap_or_else(|| sniff_mime(&bytes)),
        };

        debug!(
            example = asset.name,
            path = %path.display(),
            size = bytes.len(),
            mime = mime_type,
            "Loaded example asset"
        );

        Ok(ImageSubmission::new(
            bytes,
            format!("{}.{}", asset.name, extension),
            mime_type,
        ))
    }
}

fn slug(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

fn mime_from_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_display_name_and_slug() {
        let catalog = ExampleCatalog::new("/unused");
        assert_eq!(catalog.find("Masala Dosa").unwrap().path, "examples/masala_dosa.jpg");
        assert_eq!(catalog.find("masala_dosa").unwrap().name, "Masala Dosa");
        assert_eq!(catalog.find("HARA-BHARA-KABAB").unwrap().name, "Hara Bhara Kabab");
        assert!(catalog.find("pav bhaji").is_none());
    }

    #[test]
    fn test_catalog_has_eight_entries() {
        assert_eq!(ExampleCatalog::new("/unused").entries().len(), 8);
    }

    #[tokio::test]
    async fn test_resolve_reads_bytes_and_names_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("examples")).unwrap();
        // JPEG magic bytes
        std::fs::write(dir.path().join("examples/pani_puri.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).unwrap();

        let catalog = ExampleCatalog::new(dir.path());
        let asset = catalog.find("Pani Puri").unwrap();
        let submission = catalog.resolve(asset).await.unwrap();

        assert_eq!(submission.declared_name(), "Pani Puri.jpg");
        assert_eq!(submission.mime_type(), "image/jpeg");
        assert_eq!(submission.bytes().len(), 6);
    }

    #[tokio::test]
    async fn test_resolve_unsniffable_content_uses_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("examples")).unwrap();
        std::fs::write(dir.path().join("examples/falooda.jpg"), b"not really a jpeg").unwrap();

        let catalog = ExampleCatalog::new(dir.path());
        let submission = catalog.resolve(catalog.find("Falooda").unwrap()).await.unwrap();
        assert_eq!(submission.mime_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn test_resolve_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ExampleCatalog::new(dir.path());
        let result = catalog.resolve(catalog.find("Biryani").unwrap()).await;
        assert!(matches!(result, Err(CatalogError::AssetRead { .. })));
    }
}
