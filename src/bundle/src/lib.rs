//! Conduct Bundle - OCI image to bundle translation.
//!
//! Unpacks an exported OCI image layout and synthesizes the `bundle.conf`
//! descriptor that lets the orchestrator run the image as a bundle
//! component.

pub mod args;
pub mod conf;
pub mod descriptor;
pub mod oci;
pub mod package;

// Re-export common types
pub use args::ComponentArgs;
pub use conf::{ConfObject, ConfValue};
pub use descriptor::{build_descriptor, render_descriptor, ComponentBlock, EndpointSpec};
pub use oci::{locate_and_extract, OciImage};
pub use package::write_bundle;

/// Name of the descriptor file inside a bundle.
pub const BUNDLE_CONF: &str = "bundle.conf";
