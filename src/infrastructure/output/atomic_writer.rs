//! Diff-aware atomic file output

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::core::error::{Error, Result};

/// Writes a destination file through a temporary sibling and a rename.
///
/// Readers of the destination see either the old or the new contents, never
/// a partial write. Two writers racing on one destination are not serialized;
/// the last rename wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtomicFileWriter;

impl AtomicFileWriter {
    pub fn new() -> Self {
        Self
    }

    /// Replaces the contents of `dest` with `contents` unless they are equal.
    ///
    /// Returns whether the destination changed. The destination keeps its
    /// permission bits and owner; a missing destination is created first. On
    /// every error path the temporary file is removed.
    pub fn write(&self, dest: &Path, contents: &[u8]) -> Result<bool> {
        let dest_dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = Builder::new()
            .prefix("docker-gen")
            .tempfile_in(dest_dir)
            .map_err(|e| Error::filesystem("create temp file in", dest_dir, e))?;
        temp.write_all(contents)
            .map_err(|e| Error::filesystem("write temp file for", dest, e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| Error::filesystem("sync temp file for", dest, e))?;

        if !dest.exists() {
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(dest)
                .map_err(|e| Error::filesystem("create", dest, e))?;
        }

        copy_metadata(dest, &temp)?;

        let old_contents =
            fs::read(dest).map_err(|e| Error::filesystem("compare current file", dest, e))?;
        if old_contents == contents {
            debug!(dest = %dest.display(), "Contents unchanged, discarding temp file");
            return Ok(false);
        }

        temp.persist(dest)
            .map_err(|e| Error::filesystem("rename temp file to", dest, e.error))?;
        Ok(true)
    }
}

fn copy_metadata(dest: &Path, temp: &NamedTempFile) -> Result<()> {
    let metadata = fs::metadata(dest).map_err(|e| Error::filesystem("stat", dest, e))?;
    let file: &File = temp.as_file();

    file.set_permissions(metadata.permissions())
        .map_err(|e| Error::filesystem("chmod temp file for", dest, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        std::os::unix::fs::fchown(file, Some(metadata.uid()), Some(metadata.gid()))
            .map_err(|e| Error::filesystem("chown temp file for", dest, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_entries(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("docker-gen"))
            .count()
    }

    #[test]
    fn test_write_creates_missing_destination() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("default.conf");

        assert!(AtomicFileWriter::new().write(&dest, b"server {}\n").unwrap());
        assert_eq!(fs::read(&dest).unwrap(), b"server {}\n");
        assert_eq!(temp_entries(dir.path()), 0);
    }

    #[test]
    fn test_write_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("default.conf");
        let writer = AtomicFileWriter::new();

        assert!(writer.write(&dest, b"upstream a {}\n").unwrap());
        assert!(!writer.write(&dest, b"upstream a {}\n").unwrap());
        assert_eq!(fs::read(&dest).unwrap(), b"upstream a {}\n");
        assert_eq!(temp_entries(dir.path()), 0);

        assert!(writer.write(&dest, b"upstream b {}\n").unwrap());
        assert_eq!(fs::read(&dest).unwrap(), b"upstream b {}\n");
    }

    #[test]
    fn test_write_empty_contents_to_missing_destination_is_unchanged() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.conf");

        assert!(!AtomicFileWriter::new().write(&dest, b"").unwrap());
        assert!(dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("default.conf");
        fs::write(&dest, "old").unwrap();
        fs::set_permissions(&dest, fs::Permissions::from_mode(0o640)).unwrap();

        assert!(AtomicFileWriter::new().write(&dest, b"new").unwrap());
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("missing/default.conf");

        let err = AtomicFileWriter::new().write(&dest, b"x").unwrap_err();
        assert!(matches!(err, Error::Filesystem { action: "create temp file in", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_after_temp_file_removes_it() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("conf.d");
        fs::create_dir(&dest).unwrap();

        let err = AtomicFileWriter::new().write(&dest, b"x").unwrap_err();
        assert!(matches!(err, Error::Filesystem { action: "compare current file", .. }));
        assert_eq!(temp_entries(dir.path()), 0);
        assert!(dest.is_dir());
    }
}
