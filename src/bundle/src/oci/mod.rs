//! OCI image layout handling.
//!
//! An exported image is located inside a directory or tar archive, unpacked,
//! and its manifest and configuration are read for bundle synthesis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  export.tar / export-dir/                                    │
//! │  └── any/prefix/                                             │
//! │      ├── oci-layout           (OCI layout marker)            │
//! │      ├── index.json           (Image index)                  │
//! │      └── blobs/                                              │
//! │          └── sha256/                                         │
//! │              ├── <manifest>   (annotations)                  │
//! │              ├── <config>     (ExposedPorts)                 │
//! │              └── <layers>                                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod image;
pub mod layout;

pub use image::{OciImage, REF_NAME_ANNOTATION};
pub use layout::{
    locate_and_extract, unpack_layout, DirectoryWalker, LayoutWalker, TarWalker,
    OCI_LAYOUT_MARKER,
};
