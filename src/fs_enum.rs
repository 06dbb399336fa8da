use crate::error::{Error, Result};
use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Component, Path, PathBuf};
// Served-directory enumeration and membership tests

/// One name from the served directory; no metadata is carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    name: OsString,
}

impl DirectoryEntry {
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Raw bytes of the name, used for exact matching and for the wire.
    #[cfg(unix)]
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        use std::os::unix::ffi::OsStrExt;
        Cow::Borrowed(self.name.as_bytes())
    }

    #[cfg(not(unix))]
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self.name.to_string_lossy() {
            Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
            Cow::Owned(s) => Cow::Owned(s.into_bytes()),
        }
    }
}

/// Lazy, single-pass enumeration of a directory.
///
/// Order is whatever the filesystem yields. `.` and `..` never appear.
pub struct DirEntries {
    path: PathBuf,
    inner: fs::ReadDir,
}

impl Iterator for DirEntries {
    type Item = Result<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.next()?;
        Some(
            entry
                .map(|e| DirectoryEntry {
                    name: e.file_name(),
                })
                .map_err(|source| Error::DirectoryUnavailable {
                    path: self.path.clone(),
                    source,
                }),
        )
    }
}

pub fn list_entries(path: &Path) -> Result<DirEntries> {
    let inner = fs::read_dir(path).map_err(|source| Error::DirectoryUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(DirEntries {
        path: path.to_path_buf(),
        inner,
    })
}

/// True if `name` is a plain single component: not empty, not `.`/`..`,
/// no path separator and no NUL.
pub fn is_plain_name(name: &[u8]) -> bool {
    !name.is_empty()
        && name != b"."
        && name != b".."
        && !name.iter().any(|&b| b == b'/' || b == b'\\' || b == 0)
}

/// Exact, byte-for-byte membership test against a fresh enumeration.
///
/// Names that could address anything outside `path` are never members.
pub fn contains(path: &Path, name: &[u8]) -> Result<bool> {
    if !is_plain_name(name) {
        return Ok(false);
    }
    for entry in list_entries(path)? {
        if entry?.as_bytes().as_ref() == name {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(unix)]
fn name_to_os(name: &[u8]) -> OsString {
    use std::os::unix::ffi::OsStrExt;
    OsStr::from_bytes(name).to_os_string()
}

#[cfg(not(unix))]
fn name_to_os(name: &[u8]) -> OsString {
    OsString::from(String::from_utf8_lossy(name).into_owned())
}

/// Resolve an entry name to its canonical path, ensuring it stays under root.
/// This prevents escape through:
/// 1. Names that are not a single plain component
/// 2. Symlinks inside root pointing outside of it
pub fn resolve_under_root(root: &Path, name: &[u8]) -> Result<PathBuf> {
    let escapes = |what: &str| Error::DirectoryUnavailable {
        path: root.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, what.to_string()),
    };

    if !is_plain_name(name) {
        return Err(escapes("name is not a plain entry"));
    }
    let rel = PathBuf::from(name_to_os(name));
    if rel.components().count() != 1 || !matches!(rel.components().next(), Some(Component::Normal(_))) {
        return Err(escapes("name is not a plain entry"));
    }

    let canon_root = root
        .canonicalize()
        .map_err(|source| Error::DirectoryUnavailable {
            path: root.to_path_buf(),
            source,
        })?;
    let canon = canon_root
        .join(&rel)
        .canonicalize()
        .map_err(|source| Error::DirectoryUnavailable {
            path: root.to_path_buf(),
            source,
        })?;

    // Ensure final path is under root
    if !canon.starts_with(&canon_root) {
        return Err(escapes("entry resolves outside the served directory"));
    }
    Ok(canon)
}
