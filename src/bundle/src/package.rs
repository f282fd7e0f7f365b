//! Bundle archive packaging.
//!
//! A bundle is a gzip tar laid out as:
//!
//! ```text
//! <bundle-name>/bundle.conf
//! <bundle-name>/<component-name>/oci-layout
//! <bundle-name>/<component-name>/index.json
//! <bundle-name>/<component-name>/blobs/...
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};

use conduct_core::error::{ConductError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, Header};

use crate::BUNDLE_CONF;

/// Write a bundle archive holding `bundle_conf` and the unpacked image
/// layout at `layout_dir`.
pub fn write_bundle(
    output: &Path,
    bundle_name: &str,
    component_name: &str,
    bundle_conf: &str,
    layout_dir: &Path,
) -> Result<PathBuf> {
    if bundle_name.is_empty() || bundle_name.contains('/') {
        return Err(ConductError::Config(format!(
            "invalid bundle name '{}'",
            bundle_name
        )));
    }
    if component_name.is_empty() || component_name.contains('/') {
        return Err(ConductError::Config(format!(
            "invalid component name '{}'",
            component_name
        )));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(output)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    let mut header = Header::new_gnu();
    header.set_size(bundle_conf.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(
        &mut header,
        format!("{}/{}", bundle_name, BUNDLE_CONF),
        bundle_conf.as_bytes(),
    )?;

    builder.append_dir_all(format!("{}/{}", bundle_name, component_name), layout_dir)?;

    builder.into_inner()?.finish()?;

    tracing::debug!(output = %output.display(), bundle = bundle_name, "Wrote bundle archive");

    Ok(output.to_path_buf())
}
