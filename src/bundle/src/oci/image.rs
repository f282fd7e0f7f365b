//! OCI image manifest and configuration loaded from an unpacked layout.
//!
//! The manifest and config are kept as raw JSON: manifest annotations may
//! carry numbers, and only a few fields are read.

use std::path::{Path, PathBuf};

use conduct_core::error::{ConductError, Result};
use oci_spec::image::ImageIndex;
use serde_json::Value;

use super::layout::OCI_LAYOUT_MARKER;

/// Index annotation holding the image's tag.
pub const REF_NAME_ANNOTATION: &str = "org.opencontainers.image.ref.name";

/// An OCI image read from an unpacked layout directory.
#[derive(Debug, Clone)]
pub struct OciImage {
    /// Root directory of the OCI image layout
    root_dir: PathBuf,

    /// Manifest digest taken from index.json
    manifest_digest: String,

    /// Tag recorded in index.json, if any
    ref_name: Option<String>,

    /// Image manifest
    manifest: Value,

    /// Image configuration
    config: Value,
}

impl OciImage {
    /// Load the first image listed in a layout's `index.json`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - `oci-layout` or `index.json` is missing
    /// - the index lists no manifests
    /// - a blob is missing or is not valid JSON
    /// - the manifest has no config digest
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root_dir = path.as_ref().to_path_buf();

        Self::validate_oci_layout(&root_dir)?;

        let index = Self::load_index(&root_dir)?;
        let descriptor = index.manifests().first().ok_or_else(|| {
            ConductError::Format("index.json lists no manifests".to_string())
        })?;

        let manifest_digest = descriptor.digest().to_string();
        let ref_name = descriptor
            .annotations()
            .as_ref()
            .and_then(|a| a.get(REF_NAME_ANNOTATION))
            .cloned();

        let manifest = Self::load_blob_json(&root_dir, &manifest_digest)?;

        let config_digest = manifest
            .get("config")
            .and_then(|c| c.get("digest"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ConductError::Format(format!(
                    "manifest {} has no config digest",
                    manifest_digest
                ))
            })?
            .to_string();
        let config = Self::load_blob_json(&root_dir, &config_digest)?;

        tracing::debug!(
            root = %root_dir.display(),
            manifest = %manifest_digest,
            config = %config_digest,
            "Loaded OCI image"
        );

        Ok(Self {
            root_dir,
            manifest_digest,
            ref_name,
            manifest,
            config,
        })
    }

    /// Build an image from an already-parsed manifest and config.
    pub fn from_values(manifest: Value, config: Value) -> Self {
        Self {
            root_dir: PathBuf::new(),
            manifest_digest: String::new(),
            ref_name: None,
            manifest,
            config,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn manifest_digest(&self) -> &str {
        &self.manifest_digest
    }

    /// Tag from the index's `org.opencontainers.image.ref.name` annotation.
    pub fn ref_name(&self) -> Option<&str> {
        self.ref_name.as_deref()
    }

    pub fn manifest(&self) -> &Value {
        &self.manifest
    }

    pub fn config(&self) -> &Value {
        &self.config
    }

    fn validate_oci_layout(root_dir: &Path) -> Result<()> {
        for required in [OCI_LAYOUT_MARKER, "index.json"] {
            if !root_dir.join(required).exists() {
                return Err(ConductError::OciImage(format!(
                    "Not a valid OCI layout: missing {} in {}",
                    required,
                    root_dir.display()
                )));
            }
        }
        Ok(())
    }

    fn load_index(root_dir: &Path) -> Result<ImageIndex> {
        let index_path = root_dir.join("index.json");
        let content = std::fs::read_to_string(&index_path)?;
        serde_json::from_str(&content).map_err(|e| {
            ConductError::Serialization(format!("Failed to parse index.json: {}", e))
        })
    }

    fn load_blob_json(root_dir: &Path, digest: &str) -> Result<Value> {
        let blob_path = Self::blob_path(root_dir, digest)?;
        let content = std::fs::read_to_string(&blob_path).map_err(|e| {
            ConductError::OciImage(format!(
                "Failed to read blob {} at {}: {}",
                digest,
                blob_path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ConductError::Serialization(format!("Failed to parse blob {}: {}", digest, e))
        })
    }

    /// `sha256:abc…` → `<root>/blobs/sha256/abc…`
    fn blob_path(root_dir: &Path, digest: &str) -> Result<PathBuf> {
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '_' | '-'))
                && part != "."
                && part != ".."
        };

        match digest.split_once(':') {
            Some((algorithm, hex)) if valid(algorithm) && valid(hex) => {
                Ok(root_dir.join("blobs").join(algorithm).join(hex))
            }
            _ => Err(ConductError::Format(format!("invalid digest '{}'", digest))),
        }
    }
}
