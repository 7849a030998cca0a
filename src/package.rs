//! Package reader capability
//!
//! Package previews show a package's name, description and embedded image
//! before it is installed. Reading the archive itself is up to a
//! [`PackageReader`]; [`ManifestPackageReader`] covers unpacked packages that
//! describe themselves with a JSON manifest.

use serde::Deserialize;
use std::path::Path;

/// What a package preview displays
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackageInfo {
    pub name: String,
    pub description: String,
    /// Encoded preview image bytes
    pub image: Option<Vec<u8>>,
}

/// Reads the preview data of a package file
pub trait PackageReader: Send + Sync {
    fn read_package(&self, path: &Path) -> anyhow::Result<PackageInfo>;
}

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    #[serde(default)]
    description: String,
    /// Relative to the manifest's directory
    #[serde(default)]
    image: Option<String>,
}

/// Reads `{ "name", "description", "image" }` JSON manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestPackageReader;

impl ManifestPackageReader {
    pub fn new() -> Self {
        Self
    }
}

impl PackageReader for ManifestPackageReader {
    fn read_package(&self, path: &Path) -> anyhow::Result<PackageInfo> {
        let text = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&text)?;

        let image = match manifest.image.filter(|image| !image.is_empty()) {
            Some(relative) => {
                let image_path = path.parent().unwrap_or(Path::new(".")).join(relative);
                match std::fs::read(&image_path) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        log::warn!(
                            "Package image {} could not be read: {e}",
                            image_path.display()
                        );
                        None
                    }
                }
            }
            None => None,
        };

        Ok(PackageInfo {
            name: manifest.name,
            description: manifest.description,
            image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_with_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cover.png"), b"png bytes").unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(
            &manifest,
            r#"{ "name": "Coastal Line", "description": "Two stations", "image": "cover.png" }"#,
        )
        .unwrap();

        let info = ManifestPackageReader::new().read_package(&manifest).unwrap();
        assert_eq!(info.name, "Coastal Line");
        assert_eq!(info.description, "Two stations");
        assert_eq!(info.image.as_deref(), Some(&b"png bytes"[..]));
    }

    #[test]
    fn test_manifest_missing_image_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(&manifest, r#"{ "name": "Bare", "image": "gone.png" }"#).unwrap();

        let info = ManifestPackageReader::new().read_package(&manifest).unwrap();
        assert_eq!(info.description, "");
        assert!(info.image.is_none());
    }

    #[test]
    fn test_invalid_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("package.json");
        std::fs::write(&manifest, "{ \"description\": 1 }").unwrap();
        assert!(ManifestPackageReader::new().read_package(&manifest).is_err());
    }
}
