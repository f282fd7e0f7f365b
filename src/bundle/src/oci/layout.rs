//! Locating an OCI image layout inside a directory tree or tar archive.
//!
//! Image exports often wrap the layout in extra directories
//! (`image/oci/oci-layout`). The layout root is the directory holding the
//! `oci-layout` marker file; only that subtree is unpacked.
//!
//! Both source kinds go through [`LayoutWalker`], so the search and the
//! extraction are written once:
//!
//! - [`DirectoryWalker`] walks a directory, children sorted by name
//! - [`TarWalker`] reads a tar stream (plain or gzip), rewinding per pass

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use conduct_core::error::Result;
use flate2::read::GzDecoder;
use tar::Archive;

/// Marker file identifying the root of an OCI image layout.
pub const OCI_LAYOUT_MARKER: &str = "oci-layout";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Kind of a walked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a walk.
pub struct WalkEntry<'a> {
    /// Path relative to the source root, without `.` components
    pub path: &'a Path,
    pub kind: EntryKind,
    /// File content (empty for directories)
    pub content: &'a mut dyn Read,
}

/// A source of layout entries that can be walked more than once.
pub trait LayoutWalker {
    /// Visit every entry in traversal order. An error from `visit` stops
    /// the walk and is returned.
    fn walk(&mut self, visit: &mut dyn FnMut(WalkEntry<'_>) -> Result<()>) -> Result<()>;
}

/// Walks a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
}

impl DirectoryWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl LayoutWalker for DirectoryWalker {
    fn walk(&mut self, visit: &mut dyn FnMut(WalkEntry<'_>) -> Result<()>) -> Result<()> {
        walk_dir(&self.root, Path::new(""), visit)
    }
}

fn walk_dir(
    root: &Path,
    relative: &Path,
    visit: &mut dyn FnMut(WalkEntry<'_>) -> Result<()>,
) -> Result<()> {
    let mut children = fs::read_dir(root.join(relative))?.collect::<std::io::Result<Vec<_>>>()?;
    children.sort_by_key(|child| child.file_name());

    for child in children {
        let path = relative.join(child.file_name());
        let file_type = child.file_type()?;

        if file_type.is_dir() {
            visit(WalkEntry {
                path: &path,
                kind: EntryKind::Directory,
                content: &mut std::io::empty(),
            })?;
            walk_dir(root, &path, visit)?;
        } else if file_type.is_file() {
            let mut file = File::open(child.path())?;
            visit(WalkEntry {
                path: &path,
                kind: EntryKind::File,
                content: &mut file,
            })?;
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-regular file");
        }
    }

    Ok(())
}

/// Walks a tar stream. Gzip compression is detected from the first bytes.
pub struct TarWalker<R> {
    reader: R,
}

impl<R: Read + Seek> TarWalker<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    fn is_gzip(&mut self) -> Result<bool> {
        self.reader.seek(SeekFrom::Start(0))?;
        let mut magic = [0u8; 2];
        let gzip = match self.reader.read_exact(&mut magic) {
            Ok(()) => magic == GZIP_MAGIC,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => false,
            Err(e) => return Err(e.into()),
        };
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(gzip)
    }
}

impl TarWalker<File> {
    /// Open a tar (or tar.gz) file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read + Seek> LayoutWalker for TarWalker<R> {
    fn walk(&mut self, visit: &mut dyn FnMut(WalkEntry<'_>) -> Result<()>) -> Result<()> {
        if self.is_gzip()? {
            walk_archive(Archive::new(GzDecoder::new(&mut self.reader)), visit)
        } else {
            walk_archive(Archive::new(&mut self.reader), visit)
        }
    }
}

fn walk_archive<T: Read>(
    mut archive: Archive<T>,
    visit: &mut dyn FnMut(WalkEntry<'_>) -> Result<()>,
) -> Result<()> {
    for entry in archive.entries()? {
        let mut entry = entry?;
        let raw = entry.path()?.into_owned();

        let Some(path) = normalize_entry_path(&raw) else {
            tracing::warn!(path = %raw.display(), "Skipping archive entry outside the archive root");
            continue;
        };
        if path.as_os_str().is_empty() {
            continue;
        }

        let entry_type = entry.header().entry_type();
        let kind = if entry_type.is_dir() {
            EntryKind::Directory
        } else if entry_type.is_file() {
            EntryKind::File
        } else {
            tracing::debug!(path = %path.display(), "Skipping non-regular archive entry");
            continue;
        };

        visit(WalkEntry {
            path: &path,
            kind,
            content: &mut entry,
        })?;
    }

    Ok(())
}

/// Strip `.` components. `None` for absolute paths or paths with `..`.
fn normalize_entry_path(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}

/// Find the directory holding the `oci-layout` marker.
///
/// Returns the marker's parent relative to the source root (empty for a
/// top-level marker). When several markers exist the first one in
/// traversal order is used.
pub fn find_layout_root(walker: &mut dyn LayoutWalker) -> Result<Option<PathBuf>> {
    let mut root: Option<PathBuf> = None;

    walker.walk(&mut |entry: WalkEntry<'_>| {
        if entry.kind == EntryKind::File
            && entry.path.file_name() == Some(OsStr::new(OCI_LAYOUT_MARKER))
        {
            let parent = entry.path.parent().map(Path::to_path_buf).unwrap_or_default();
            if root.is_none() {
                root = Some(parent);
            } else {
                tracing::warn!(
                    marker = %entry.path.display(),
                    "Ignoring additional oci-layout marker"
                );
            }
        }
        Ok(())
    })?;

    Ok(root)
}

/// Unpack the layout subtree of `walker` into `destination`.
///
/// Returns `Ok(false)` without touching `destination` when no marker is
/// found. I/O failures (unreadable source, corrupt archive, destination
/// not creatable) are errors.
pub fn unpack_layout(destination: &Path, walker: &mut dyn LayoutWalker) -> Result<bool> {
    let Some(root) = find_layout_root(walker)? else {
        tracing::debug!("No oci-layout marker found");
        return Ok(false);
    };

    fs::create_dir_all(destination)?;

    let mut files = 0usize;
    walker.walk(&mut |entry: WalkEntry<'_>| {
        let Ok(relative) = entry.path.strip_prefix(&root) else {
            return Ok(());
        };
        if relative.as_os_str().is_empty() {
            return Ok(());
        }

        let target = destination.join(relative);
        match entry.kind {
            EntryKind::Directory => fs::create_dir_all(&target)?,
            EntryKind::File => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut file = File::create(&target)?;
                std::io::copy(entry.content, &mut file)?;
                files += 1;
            }
        }
        Ok(())
    })?;

    tracing::info!(
        root = %root.display(),
        destination = %destination.display(),
        files,
        "Unpacked OCI image layout"
    );

    Ok(true)
}

/// Locate an OCI layout in `source` and unpack it into `destination`.
///
/// `source` is a directory when `is_directory` is set, otherwise a tar
/// file (optionally gzip compressed).
pub fn locate_and_extract(destination: &Path, source: &Path, is_directory: bool) -> Result<bool> {
    if is_directory {
        unpack_layout(destination, &mut DirectoryWalker::new(source))
    } else {
        unpack_layout(destination, &mut TarWalker::open(source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduct_core::error::ConductError;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).unwrap();
        encoder.finish().unwrap()
    }

    fn unpack_tar(dest: &Path, bytes: Vec<u8>) -> bool {
        unpack_layout(dest, &mut TarWalker::new(Cursor::new(bytes))).unwrap()
    }

    #[test]
    fn test_tar_wrong_format() {
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("out");

        assert!(!unpack_tar(&out, tar_bytes(&[("testing", b"hello")])));
        assert!(!out.exists());
    }

    #[test]
    fn test_dir_wrong_format() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("testing"), "hello").unwrap();

        assert!(!locate_and_extract(dest.path(), src.path(), true).unwrap());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_toplevel_tar() {
        let dest = TempDir::new().unwrap();

        assert!(unpack_tar(dest.path(), tar_bytes(&[("oci-layout", b"hello")])));
        assert_eq!(
            fs::read_to_string(dest.path().join("oci-layout")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn test_nested_tar() {
        let dest = TempDir::new().unwrap();
        let bytes = tar_bytes(&[
            ("README", b"outside"),
            ("testing/nested/dirs/oci-layout", b"hello"),
            ("testing/nested/dirs/blobs/sha256/abc", b"blob"),
        ]);

        assert!(unpack_tar(dest.path(), bytes));
        assert!(dest.path().join("oci-layout").exists());
        assert_eq!(
            fs::read_to_string(dest.path().join("blobs/sha256/abc")).unwrap(),
            "blob"
        );
        assert!(!dest.path().join("README").exists());
        assert!(!dest.path().join("testing").exists());
    }

    #[test]
    fn test_gzip_tar() {
        let dest = TempDir::new().unwrap();
        let bytes = gzip(&tar_bytes(&[("image/oci-layout", b"{}"), ("image/index.json", b"{}")]));

        assert!(unpack_tar(dest.path(), bytes));
        assert!(dest.path().join("oci-layout").exists());
        assert!(dest.path().join("index.json").exists());
    }

    #[test]
    fn test_tar_dot_prefixed_entries() {
        let dest = TempDir::new().unwrap();
        assert!(unpack_tar(dest.path(), tar_bytes(&[("./oci-layout", b"x"), ("./index.json", b"{}")])));
        assert!(dest.path().join("index.json").exists());
    }

    #[test]
    fn test_tar_file_on_disk() {
        let work = TempDir::new().unwrap();
        let archive = work.path().join("image.tar");
        fs::write(&archive, tar_bytes(&[("oci/oci-layout", b"x")])).unwrap();
        let dest = work.path().join("out");

        assert!(locate_and_extract(&dest, &archive, false).unwrap());
        assert!(dest.join("oci-layout").exists());
    }

    #[test]
    fn test_toplevel_dir() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(src.path().join("oci-layout"), "testing").unwrap();

        assert!(locate_and_extract(dest.path(), src.path(), true).unwrap());
        assert_eq!(
            fs::read_to_string(dest.path().join("oci-layout")).unwrap(),
            "testing"
        );
    }

    #[test]
    fn test_nested_dir() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let nested = src.path().join("testing").join("nested").join("dirs");
        fs::create_dir_all(nested.join("blobs").join("sha256")).unwrap();
        fs::write(nested.join("oci-layout"), "testing").unwrap();
        fs::write(nested.join("blobs").join("sha256").join("abc"), "blob").unwrap();
        fs::write(src.path().join("other.txt"), "ignored").unwrap();

        assert!(locate_and_extract(dest.path(), src.path(), true).unwrap());
        assert!(dest.path().join("oci-layout").exists());
        assert!(dest.path().join("blobs/sha256/abc").exists());
        assert!(!dest.path().join("other.txt").exists());
    }

    #[test]
    fn test_marker_directory_is_not_a_layout() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir(src.path().join("oci-layout")).unwrap();

        assert!(!locate_and_extract(dest.path(), src.path(), true).unwrap());
    }

    #[test]
    fn test_first_marker_wins() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for (dir, content) in [("a", "first"), ("b", "second")] {
            fs::create_dir(src.path().join(dir)).unwrap();
            fs::write(src.path().join(dir).join("oci-layout"), content).unwrap();
        }

        assert!(locate_and_extract(dest.path(), src.path(), true).unwrap());
        assert_eq!(
            fs::read_to_string(dest.path().join("oci-layout")).unwrap(),
            "first"
        );
    }

    #[test]
    fn test_missing_source_dir_is_error() {
        let dest = TempDir::new().unwrap();
        let missing = dest.path().join("missing");
        assert!(locate_and_extract(dest.path(), &missing, true).is_err());
    }

    #[test]
    fn test_missing_tar_is_error() {
        let dest = TempDir::new().unwrap();
        let missing = dest.path().join("missing.tar");
        assert!(locate_and_extract(dest.path(), &missing, false).is_err());
    }

    #[test]
    fn test_truncated_tar_is_error() {
        let dest = TempDir::new().unwrap();
        let out = dest.path().join("out");

        let err = unpack_layout(&out, &mut TarWalker::new(Cursor::new(b"hello".to_vec())))
            .unwrap_err();
        assert!(matches!(err, ConductError::Io(_)));
        assert!(!out.exists());
    }

    #[test]
    fn test_corrupt_gzip_is_error() {
        let dest = TempDir::new().unwrap();
        let mut bytes = vec![0x1f, 0x8b];
        bytes.extend_from_slice(&[0u8; 64]);

        let err = unpack_layout(dest.path(), &mut TarWalker::new(Cursor::new(bytes))).unwrap_err();
        assert!(matches!(err, ConductError::Io(_)));
    }

    #[test]
    fn test_uncreatable_destination_is_error() {
        let work = TempDir::new().unwrap();
        let blocker = work.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let bytes = tar_bytes(&[("oci-layout", b"x")]);
        let err = unpack_layout(&blocker.join("sub"), &mut TarWalker::new(Cursor::new(bytes)))
            .unwrap_err();
        assert!(matches!(err, ConductError::Io(_)));
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(
            normalize_entry_path(Path::new("./a/./b")),
            Some(PathBuf::from("a/b"))
        );
        assert_eq!(normalize_entry_path(Path::new("../etc/passwd")), None);
        assert_eq!(normalize_entry_path(Path::new("/etc/passwd")), None);
    }

    #[test]
    fn test_find_layout_root_nested() {
        let bytes = tar_bytes(&[("x/y/oci-layout", b"")]);
        let root = find_layout_root(&mut TarWalker::new(Cursor::new(bytes))).unwrap();
        assert_eq!(root, Some(PathBuf::from("x/y")));
    }
}
